use crate::models::GameResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecoveryResponse {
    pub eligible: bool,
    /// Created-at of the most recent purchase whose slip lost.
    pub eligible_since: Option<DateTime<Utc>>,
    pub games: Vec<GameResponse>,
}

impl RecoveryResponse {
    pub fn ineligible() -> Self {
        Self {
            eligible: false,
            eligible_since: None,
            games: Vec::new(),
        }
    }
}
