use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::handlers::ApiResponse;
use crate::metrics;
use crate::AppState;

pub const TOP_RATED_MESSAGE: &str = "取得評分最高營養師資料成功";

/// Top-rated nutritionists for the home page
///
/// GET /home/topNu
pub async fn get_top_nutritionists(state: web::Data<AppState>) -> Result<HttpResponse> {
    let result = state.ranking.top_rated().await;
    metrics::record_request("top_rated", &result);

    Ok(HttpResponse::Ok().json(ApiResponse::success(TOP_RATED_MESSAGE, result?)))
}
