/// HTTP handlers for nutritionist-service
///
/// Every response, success or failure, uses the same PascalCase envelope:
/// `{ StatusCode, Status, Message, Data }`, plus `Pagination` on listings.
use actix_web::http::StatusCode;
use actix_web::web;
use serde::Serialize;

use crate::error::AppError;
use crate::models::PageResult;

pub mod home;
pub mod nutritionists;

pub use home::get_top_nutritionists;
pub use nutritionists::{get_nutritionist, list_nutritionists};

/// API response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageInfo {
    pub page: i64,
    pub page_size: i64,
    pub total_records: i64,
    pub total_pages: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            status: "Success",
            message: message.into(),
            data: Some(data),
            pagination: None,
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            status: "Error",
            message: message.into(),
            data: None,
            pagination: None,
        }
    }
}

impl<E: Serialize> ApiResponse<Vec<E>> {
    pub fn success_page(message: impl Into<String>, page: PageResult<E>) -> Self {
        Self {
            pagination: Some(PageInfo {
                page: page.page,
                page_size: page.page_size,
                total_records: page.total_records,
                total_pages: page.total_pages,
            }),
            ..Self::success(message, page.entries)
        }
    }
}

/// Mount the public read routes.
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid query string: {}", err)).into()
    }))
    .route("/home/topNu", web::get().to(get_top_nutritionists))
    .route("/nutritionists", web::get().to(list_nutritionists))
    .route("/nutritionist", web::get().to(get_nutritionist));
}
