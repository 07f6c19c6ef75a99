use crate::error::AppResult;
use crate::handlers::{admin_caller, caller_with_role};
use crate::models::*;
use crate::services::{AccessService, GameService, LifecycleService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/games/upload",
    tag = "games",
    request_body = UploadGameRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Game stored", body = GameResponse),
        (status = 400, description = "Invalid code, type or price", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    )
)]
pub async fn upload_game(
    game_service: web::Data<GameService>,
    lifecycle_service: web::Data<LifecycleService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    body: web::Json<UploadGameRequest>,
) -> Result<HttpResponse> {
    let result: AppResult<GameResponse> = async {
        admin_caller(&req, &access_service).await?;
        game_service.upload(body.into_inner()).await
    }
    .await;

    match result {
        Ok(game) => {
            lifecycle_service.reconcile_in_background();
            Ok(HttpResponse::Created().json(json!({
                "success": true,
                "data": game
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All games, newest first, with the caller's purchased flag", body = Vec<GameResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_games(
    game_service: web::Data<GameService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result: AppResult<Vec<GameResponse>> = async {
        let (user, is_admin) = caller_with_role(&req, &access_service).await?;
        game_service.list_for_user(user.id, is_admin).await
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
    get,
    path = "/games/{id}",
    tag = "games",
    params(
        ("id" = i64, Path, description = "Game id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Game; booking code hidden unless free, owned or admin", body = GameResponse),
        (status = 404, description = "Game not found", body = ErrorResponse)
    )
)]
pub async fn get_game(
    game_service: web::Data<GameService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let result: AppResult<GameResponse> = async {
        let (user, is_admin) = caller_with_role(&req, &access_service).await?;
        game_service
            .get_for_user(path.into_inner(), user.id, is_admin)
            .await
    }
    .await;

    match result {
        Ok(game) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": game
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/games/{id}",
    tag = "games",
    params(
        ("id" = i64, Path, description = "Game id")
    ),
    request_body = UpdateGameRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Game updated and re-classified", body = GameResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Game not found", body = ErrorResponse)
    )
)]
pub async fn update_game(
    game_service: web::Data<GameService>,
    lifecycle_service: web::Data<LifecycleService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateGameRequest>,
) -> Result<HttpResponse> {
    let result: AppResult<GameResponse> = async {
        admin_caller(&req, &access_service).await?;
        game_service
            .update(path.into_inner(), body.into_inner())
            .await
    }
    .await;

    match result {
        Ok(game) => {
            lifecycle_service.reconcile_in_background();
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "data": game
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/games/{id}",
    tag = "games",
    params(
        ("id" = i64, Path, description = "Game id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Game deleted"),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Game not found", body = ErrorResponse)
    )
)]
pub async fn delete_game(
    game_service: web::Data<GameService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let game_id = path.into_inner();
    let result: AppResult<()> = async {
        admin_caller(&req, &access_service).await?;
        game_service.delete(game_id).await
    }
    .await;

    match result {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "id": game_id },
            "message": "Game deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/predictions",
    tag = "games",
    params(
        ("type" = Option<TypeFilter>, Query, description = "all | free | vip | correct_score | custom | recovery"),
        ("day" = Option<String>, Query, description = "yesterday | today | tomorrow | all"),
        ("date" = Option<String>, Query, description = "YYYY-MM-DD, overrides day")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Games for the selected type and day", body = Vec<GameResponse>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    )
)]
pub async fn predictions(
    game_service: web::Data<GameService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    query: web::Query<PredictionQuery>,
) -> Result<HttpResponse> {
    let result: AppResult<Vec<GameResponse>> = async {
        let (user, is_admin) = caller_with_role(&req, &access_service).await?;
        game_service.predictions(user.id, is_admin, &query).await
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

pub fn games_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/games")
            .route("", web::get().to(list_games))
            .route("/upload", web::post().to(upload_game))
            .route("/{id}", web::get().to(get_game))
            .route("/{id}", web::put().to(update_game))
            .route("/{id}", web::delete().to(delete_game)),
    )
    .route("/predictions", web::get().to(predictions));
}
