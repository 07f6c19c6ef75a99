//! Dashboard summaries. Routing by role happens in `DashboardGate`; these
//! handlers only run for callers the gate let through.

use crate::error::AppResult;
use crate::handlers::admin_caller;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{AccessService, DashboardService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

pub async fn admin_dashboard(
    dashboard_service: web::Data<DashboardService>,
    access_service: web::Data<AccessService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result: AppResult<AdminDashboard> = async {
        admin_caller(&req, &access_service).await?;
        dashboard_service.admin_summary().await
    }
    .await;

    match result {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": summary
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub async fn user_dashboard(
    dashboard_service: web::Data<DashboardService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = match current_user(&req) {
        Ok(user) => dashboard_service.user_summary(user.id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": summary
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn dashboard_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard", web::get().to(admin_dashboard))
        .route("/user-dashboard", web::get().to(user_dashboard));
}
