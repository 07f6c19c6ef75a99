pub mod admin;
pub mod booking;
pub mod dashboard;
pub mod games;
pub mod health;
pub mod news;
pub mod payment;
pub mod profile;
pub mod purchases;
pub mod recovery;

pub use admin::admin_config;
pub use booking::booking_config;
pub use dashboard::dashboard_config;
pub use games::games_config;
pub use health::health_config;
pub use news::news_config;
pub use payment::payment_config;
pub use profile::profile_config;
pub use purchases::purchases_config;
pub use recovery::recovery_config;

use crate::error::AppResult;
use crate::middlewares::current_user;
use crate::services::AccessService;
use crate::utils::AuthUser;
use actix_web::HttpRequest;

/// The caller, provided they hold the admin role.
pub(crate) async fn admin_caller(req: &HttpRequest, access: &AccessService) -> AppResult<AuthUser> {
    let user = current_user(req)?;
    access.require_admin(user.id).await?;
    Ok(user)
}

/// The caller and whether they are an admin.
pub(crate) async fn caller_with_role(
    req: &HttpRequest,
    access: &AccessService,
) -> AppResult<(AuthUser, bool)> {
    let user = current_user(req)?;
    let is_admin = access.is_admin(user.id).await?;
    Ok((user, is_admin))
}
