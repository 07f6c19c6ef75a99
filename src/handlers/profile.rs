use crate::entities::Role;
use crate::error::AppResult;
use crate::handlers::admin_caller;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{AccessService, ProfileService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/signup",
    tag = "profile",
    request_body = SignupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile created or already present; bootstrap emails become admin", body = ProfileResponse),
        (status = 400, description = "No email available", body = ErrorResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn signup(
    profile_service: web::Data<ProfileService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    let result: AppResult<ProfileResponse> = async {
        let user = current_user(&req)?;
        let profile = profile_service.signup(&user, body.into_inner()).await?;
        if profile.role == Role::Admin {
            access_service.invalidate(profile.id).await;
        }
        Ok(profile)
    }
    .await;

    match result {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "profile",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No profile yet", body = ErrorResponse)
    )
)]
pub async fn me(
    profile_service: web::Data<ProfileService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = match current_user(&req) {
        Ok(user) => profile_service.me(user.id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/promote",
    tag = "profile",
    request_body = PromoteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User promoted to admin", body = ProfileResponse),
        (status = 400, description = "Missing email", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "No user with that email", body = ErrorResponse)
    )
)]
pub async fn promote(
    profile_service: web::Data<ProfileService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    body: web::Json<PromoteRequest>,
) -> Result<HttpResponse> {
    let result: AppResult<ProfileResponse> = async {
        admin_caller(&req, &access_service).await?;
        let promoted = profile_service.promote(body.into_inner()).await?;
        access_service.invalidate(promoted.id).await;
        Ok(promoted)
    }
    .await;

    match result {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile,
            "message": "User promoted to admin"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn profile_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/signup", web::post().to(signup))
        .route("/me", web::get().to(me))
        .route("/promote", web::post().to(promote));
}
