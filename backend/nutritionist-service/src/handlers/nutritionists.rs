use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::handlers::ApiResponse;
use crate::metrics;
use crate::models::Viewer;
use crate::AppState;

pub const DIRECTORY_MESSAGE: &str = "取得所有營養師";
pub const PROFILE_MESSAGE: &str = "取得營養師資料成功";

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    /// 0 means not logged in
    #[serde(default, alias = "userId", alias = "UserId")]
    pub userid: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    #[serde(alias = "nutritionistId", alias = "NutritionistId")]
    pub nutritionistid: i32,
    #[serde(default, alias = "userId", alias = "UserId")]
    pub userid: i64,
}

/// Paginated directory of public nutritionists
///
/// GET /nutritionists?page=&userid=
pub async fn list_nutritionists(
    state: web::Data<AppState>,
    query: web::Query<DirectoryQuery>,
) -> Result<HttpResponse> {
    debug!(page = query.page, userid = query.userid, "Directory request");

    let result = match Viewer::from_user_id(query.userid) {
        Ok(viewer) => state.directory.list_page(query.page, viewer).await,
        Err(e) => Err(e),
    };
    metrics::record_request("directory", &result);

    Ok(HttpResponse::Ok().json(ApiResponse::success_page(DIRECTORY_MESSAGE, result?)))
}

/// Full profile of one nutritionist
///
/// GET /nutritionist?nutritionistid=&userid=
pub async fn get_nutritionist(
    state: web::Data<AppState>,
    query: web::Query<ProfileQuery>,
) -> Result<HttpResponse> {
    debug!(
        nutritionist_id = query.nutritionistid,
        userid = query.userid,
        "Profile request"
    );

    let result = match Viewer::from_user_id(query.userid) {
        Ok(viewer) => state.profile.get_profile(query.nutritionistid, viewer).await,
        Err(e) => Err(e),
    };
    metrics::record_request("profile", &result);

    Ok(HttpResponse::Ok().json(ApiResponse::success(PROFILE_MESSAGE, result?)))
}
