use crate::entities::{Role, profile_entity};
use crate::models::PurchaseResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    /// Falls back to the email carried by the access token.
    #[schema(example = "kofi@example.com")]
    pub email: Option<String>,
    #[schema(example = "Kofi Mensah")]
    pub full_name: Option<String>,
    #[schema(example = "+233201234567")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PromoteRequest {
    #[schema(example = "ama@example.com")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<profile_entity::Model> for ProfileResponse {
    fn from(m: profile_entity::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            full_name: m.full_name,
            phone: m.phone,
            role: m.role,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminDashboard {
    pub total_users: u64,
    pub total_games: u64,
    pub total_purchases: u64,
    pub recent_purchases: Vec<PurchaseResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDashboard {
    pub profile: Option<ProfileResponse>,
    pub role: Role,
    pub purchases: Vec<PurchaseResponse>,
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ama@Example.COM "), "ama@example.com");
    }

    #[test]
    fn test_set_role_request_parses_role() {
        let req: SetRoleRequest = serde_json::from_str(r#"{"role":"admin"}"#).unwrap();
        assert_eq!(req.role, Role::Admin);
        assert!(serde_json::from_str::<SetRoleRequest>(r#"{"role":"owner"}"#).is_err());
    }
}
