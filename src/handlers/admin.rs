use crate::error::{AppError, AppResult};
use crate::handlers::admin_caller;
use crate::models::*;
use crate::services::{
    AccessService, GameService, LifecycleService, ProfileService, ReconcileReport,
};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(
        ("page" = Option<u64>, Query, description = "Page, from 1"),
        ("page_size" = Option<u64>, Query, description = "Page size, at most 100")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profiles, newest first"),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    )
)]
pub async fn list_users(
    profile_service: web::Data<ProfileService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let result: AppResult<PaginatedResponse<ProfileResponse>> = async {
        admin_caller(&req, &access_service).await?;
        profile_service.list(&query).await
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
    put,
    path = "/admin/users/{id}/role",
    tag = "admin",
    params(
        ("id" = Uuid, Path, description = "Profile id")
    ),
    request_body = SetRoleRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Role updated", body = ProfileResponse),
        (status = 400, description = "Admins cannot change their own role", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse)
    )
)]
pub async fn set_user_role(
    profile_service: web::Data<ProfileService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<SetRoleRequest>,
) -> Result<HttpResponse> {
    let target = path.into_inner();
    let result: AppResult<ProfileResponse> = async {
        let admin = admin_caller(&req, &access_service).await?;
        if admin.id == target {
            return Err(AppError::ValidationError(
                "You cannot change your own role".to_string(),
            ));
        }
        let updated = profile_service.set_role(target, body.role).await?;
        access_service.invalidate(target).await;
        Ok(updated)
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
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    params(
        ("id" = Uuid, Path, description = "Profile id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile deleted"),
        (status = 400, description = "Admins cannot delete themselves", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    profile_service: web::Data<ProfileService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let target = path.into_inner();
    let result: AppResult<()> = async {
        let admin = admin_caller(&req, &access_service).await?;
        if admin.id == target {
            return Err(AppError::ValidationError(
                "You cannot delete your own account".to_string(),
            ));
        }
        profile_service.delete(target).await?;
        access_service.invalidate(target).await;
        Ok(())
    }
    .await;

    match result {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "id": target },
            "message": "User deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/games/archived",
    tag = "admin",
    params(
        ("q" = Option<String>, Query, description = "Search booking code, name or type")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Archived games with age and deletion eligibility", body = Vec<ArchivedGameResponse>),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    )
)]
pub async fn archived_games(
    game_service: web::Data<GameService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    query: web::Query<ArchivedQuery>,
) -> Result<HttpResponse> {
    let result: AppResult<Vec<ArchivedGameResponse>> = async {
        admin_caller(&req, &access_service).await?;
        game_service.archived(query.q.as_deref()).await
    }
    .await;

    match result {
        Ok(games) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": games
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/games/{id}/restore",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Game id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Game active again", body = GameResponse),
        (status = 400, description = "Game is not archived", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Game not found", body = ErrorResponse)
    )
)]
pub async fn restore_game(
    game_service: web::Data<GameService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let result: AppResult<GameResponse> = async {
        admin_caller(&req, &access_service).await?;
        game_service.restore(path.into_inner()).await
    }
    .await;

    match result {
        Ok(game) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": game,
            "message": "Game restored"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/games/reconcile",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Reconciliation report", body = ReconcileReport),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    )
)]
pub async fn reconcile_games(
    lifecycle_service: web::Data<LifecycleService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = admin_caller(&req, &access_service).await {
        return Ok(e.error_response());
    }

    let report = lifecycle_service.reconcile().await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": report
    })))
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/users", web::get().to(list_users))
            .route("/users/{id}/role", web::put().to(set_user_role))
            .route("/users/{id}", web::delete().to(delete_user))
            .route("/games/archived", web::get().to(archived_games))
            .route("/games/reconcile", web::post().to(reconcile_games))
            .route("/games/{id}/restore", web::post().to(restore_game)),
    );
}
