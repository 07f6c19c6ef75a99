pub mod auth;
pub mod cors;
pub mod dashboard_gate;

pub use auth::{AuthMiddleware, SESSION_COOKIE, current_user};
pub use cors::create_cors;
pub use dashboard_gate::{DashboardGate, GateDecision, route_decision};
