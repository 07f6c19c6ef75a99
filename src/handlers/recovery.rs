use crate::middlewares::current_user;
use crate::models::*;
use crate::services::RecoveryService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/recovery",
    tag = "recovery",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Eligibility and the recovery games it unlocks", body = RecoveryResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn recovery(
    recovery_service: web::Data<RecoveryService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = match current_user(&req) {
        Ok(user) => recovery_service.recovery_games(user.id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn recovery_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/recovery", web::get().to(recovery));
}
