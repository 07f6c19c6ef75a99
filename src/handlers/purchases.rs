use crate::error::AppResult;
use crate::handlers::admin_caller;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{AccessService, PurchaseService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/purchases",
    tag = "purchases",
    request_body = RecordPurchaseRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Purchase recorded, or already present", body = RecordOutcome),
        (status = 400, description = "Missing user_id or game_id", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    )
)]
pub async fn record_purchase(
    purchase_service: web::Data<PurchaseService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    body: web::Json<RecordPurchaseRequest>,
) -> Result<HttpResponse> {
    let result: AppResult<RecordOutcome> = async {
        admin_caller(&req, &access_service).await?;
        purchase_service.grant(body.into_inner()).await
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

#[utoipa::path(
    get,
    path = "/purchases",
    tag = "purchases",
    params(
        ("page" = Option<u64>, Query, description = "Page, from 1"),
        ("page_size" = Option<u64>, Query, description = "Page size, at most 100")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All purchases with buyer and game"),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    )
)]
pub async fn list_purchases(
    purchase_service: web::Data<PurchaseService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let result: AppResult<PaginatedResponse<PurchaseResponse>> = async {
        admin_caller(&req, &access_service).await?;
        purchase_service.list_all(&query).await
    }
    .await;

    match result {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/purchases/mine",
    tag = "purchases",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own purchases with booking codes", body = Vec<PurchaseResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn my_purchases(
    purchase_service: web::Data<PurchaseService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = match current_user(&req) {
        Ok(user) => purchase_service.list_user_purchases(user.id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(purchases) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": purchases
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/purchases/unlock",
    tag = "purchases",
    request_body = UnlockRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "What to show or do for this game", body = UnlockOutcome),
        (status = 404, description = "Game not found", body = ErrorResponse)
    )
)]
pub async fn unlock(
    purchase_service: web::Data<PurchaseService>,
    req: HttpRequest,
    body: web::Json<UnlockRequest>,
) -> Result<HttpResponse> {
    let result = match current_user(&req) {
        Ok(user) => purchase_service.unlock(&user, body.game_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": outcome
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn purchases_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/purchases")
            .route("", web::post().to(record_purchase))
            .route("", web::get().to(list_purchases))
            .route("/mine", web::get().to(my_purchases))
            .route("/unlock", web::post().to(unlock)),
    );
}
