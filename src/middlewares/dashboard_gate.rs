use crate::entities::Role;
use crate::services::AccessService;
use crate::utils::AuthUser;
use actix_web::body::EitherBody;
use actix_web::http::header::LOCATION;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_DASHBOARD_PATH: &str = "/dashboard";
pub const USER_DASHBOARD_PATH: &str = "/user-dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(&'static str),
}

fn under(path: &str, area: &str) -> bool {
    path.strip_prefix(area)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub fn is_gated(path: &str) -> bool {
    under(path, ADMIN_DASHBOARD_PATH) || under(path, USER_DASHBOARD_PATH)
}

/// Where a request for `path` should go given the caller's role (`None` = no session).
pub fn route_decision(path: &str, role: Option<Role>) -> GateDecision {
    if !is_gated(path) {
        return GateDecision::Pass;
    }
    let admin_area = under(path, ADMIN_DASHBOARD_PATH);
    let user_area = !admin_area;

    match role {
        None => GateDecision::Redirect(LOGIN_PATH),
        Some(role) if role.is_admin() && user_area => GateDecision::Redirect(ADMIN_DASHBOARD_PATH),
        Some(role) if !role.is_admin() && admin_area => GateDecision::Redirect(USER_DASHBOARD_PATH),
        Some(_) => GateDecision::Pass,
    }
}

/// Redirects dashboard requests to the area matching the caller's role.
///
/// Must sit inside `AuthMiddleware`, which attaches the session user.
pub struct DashboardGate {
    access: AccessService,
}

impl DashboardGate {
    pub fn new(access: AccessService) -> Self {
        Self { access }
    }
}

impl<S, B> Transform<S, ServiceRequest> for DashboardGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = DashboardGateService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(DashboardGateService {
            service: Rc::new(service),
            access: self.access.clone(),
        }))
    }
}

pub struct DashboardGateService<S> {
    service: Rc<S>,
    access: AccessService,
}

impl<S, B> Service<ServiceRequest> for DashboardGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();
        if !is_gated(&path) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let service = Rc::clone(&self.service);
        let access = self.access.clone();
        let user = req.extensions().get::<AuthUser>().cloned();

        Box::pin(async move {
            let role = match user {
                Some(user) => Some(access.role_of(user.id).await?),
                None => None,
            };

            match route_decision(&path, role) {
                GateDecision::Pass => service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body),
                GateDecision::Redirect(location) => {
                    log::debug!("Dashboard gate: {path} -> {location}");
                    let response = HttpResponse::Found()
                        .insert_header((LOCATION, location))
                        .finish();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
