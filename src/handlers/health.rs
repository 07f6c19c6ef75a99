use crate::models::HealthResponse;
use crate::services::{NewsService, PurchaseService};
use actix_web::{HttpResponse, Result, web};
use sea_orm::DatabaseConnection;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service status and configuration presence", body = HealthResponse)
    )
)]
pub async fn health(
    pool: web::Data<DatabaseConnection>,
    purchase_service: web::Data<PurchaseService>,
    news_service: web::Data<NewsService>,
) -> Result<HttpResponse> {
    let database = match pool.ping().await {
        Ok(()) => true,
        Err(e) => {
            log::error!("Database ping failed: {e}");
            false
        }
    };

    let status = HealthResponse {
        status: if database { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        paystack_configured: purchase_service.payment_configured(),
        news_configured: news_service.is_configured(),
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": status
    })))
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
