use crate::models::*;
use crate::services::BookingService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/booking/{code}",
    tag = "booking",
    params(
        ("code" = String, Path, description = "Bookmaker share code")
    ),
    responses(
        (status = 200, description = "Selections on the slip", body = BookingResponse),
        (status = 400, description = "Malformed code", body = ErrorResponse),
        (status = 500, description = "Bookmaker lookup failed", body = ErrorResponse)
    )
)]
pub async fn lookup_booking(
    booking_service: web::Data<BookingService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match booking_service.lookup(&path).await {
        Ok(booking) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": booking
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn booking_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/booking/{code}", web::get().to(lookup_booking));
}
