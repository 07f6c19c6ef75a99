use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{GameStatus, GameType, Match, MatchStatus, PurchaseStatus, Role};
use crate::external::{BookingMatch, NewsArticle};
use crate::handlers;
use crate::models::*;
use crate::services::ReconcileReport;
use crate::utils::lifecycle::StatusCounts;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::profile::signup,
        handlers::profile::me,
        handlers::profile::promote,
        handlers::games::upload_game,
        handlers::games::list_games,
        handlers::games::get_game,
        handlers::games::update_game,
        handlers::games::delete_game,
        handlers::games::predictions,
        handlers::purchases::record_purchase,
        handlers::purchases::list_purchases,
        handlers::purchases::my_purchases,
        handlers::purchases::unlock,
        handlers::payment::verify_payment,
        handlers::booking::lookup_booking,
        handlers::news::latest_news,
        handlers::recovery::recovery,
        handlers::admin::list_users,
        handlers::admin::set_user_role,
        handlers::admin::delete_user,
        handlers::admin::archived_games,
        handlers::admin::restore_game,
        handlers::admin::reconcile_games,
    ),
    components(
        schemas(
            GameType,
            GameStatus,
            Match,
            MatchStatus,
            PurchaseStatus,
            Role,
            StatusCounts,
            UploadGameRequest,
            UpdateGameRequest,
            GameResponse,
            ArchivedGameResponse,
            TypeFilter,
            RecordPurchaseRequest,
            VerifyPaymentRequest,
            UnlockRequest,
            UnlockOutcome,
            RecordOutcome,
            BuyerSummary,
            PurchaseResponse,
            SignupRequest,
            PromoteRequest,
            SetRoleRequest,
            ProfileResponse,
            AdminDashboard,
            UserDashboard,
            RecoveryResponse,
            BookingResponse,
            BookingMatch,
            NewsResponse,
            NewsArticle,
            ReconcileReport,
            HealthResponse,
            ErrorResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and dependency status"),
        (name = "profile", description = "Profiles and roles"),
        (name = "games", description = "Tip slips and predictions"),
        (name = "purchases", description = "Purchases and unlocking"),
        (name = "payment", description = "Paystack payment verification"),
        (name = "booking", description = "SportyBet booking code lookup"),
        (name = "news", description = "Football news feed"),
        (name = "recovery", description = "Recovery games after a lost purchase"),
        (name = "admin", description = "Administration"),
    ),
    info(
        title = "Tipster Backend API",
        version = "1.0.0",
        description = "Betting tips marketplace REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
