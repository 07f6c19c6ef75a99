use crate::error::AppResult;
use crate::handlers::caller_with_role;
use crate::models::*;
use crate::services::{AccessService, PurchaseService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/payment/verify",
    tag = "payment",
    request_body = VerifyPaymentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment verified and purchase recorded", body = RecordOutcome),
        (status = 400, description = "Missing fields, bad reference, reference already used, underpaid or verification failed", body = ErrorResponse),
        (status = 403, description = "Recording for another user", body = ErrorResponse),
        (status = 500, description = "Payment gateway unreachable, or paid but not recorded", body = ErrorResponse)
    )
)]
pub async fn verify_payment(
    purchase_service: web::Data<PurchaseService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    body: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse> {
    let result: AppResult<RecordOutcome> = async {
        let (user, is_admin) = caller_with_role(&req, &access_service).await?;
        purchase_service
            .verify_and_record(&user, is_admin, body.into_inner())
            .await
    }
    .await;

    match result {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": outcome.message.clone(),
            "data": outcome
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/payment").route("/verify", web::post().to(verify_payment)));
}
