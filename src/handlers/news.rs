use crate::models::*;
use crate::services::NewsService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/news",
    tag = "news",
    responses(
        (status = 200, description = "Latest football headlines", body = NewsResponse),
        (status = 500, description = "News API key not configured or news API failed", body = ErrorResponse)
    )
)]
pub async fn latest_news(news_service: web::Data<NewsService>) -> Result<HttpResponse> {
    match news_service.latest().await {
        Ok(news) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": news
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn news_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/news", web::get().to(latest_news));
}
