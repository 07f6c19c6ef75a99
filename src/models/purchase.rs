use crate::entities::{PurchaseStatus, purchase_entity};
use crate::models::GameResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const SLOT_FULL_MESSAGE: &str = "Slot Full — Please wait for the next game drop!";
pub const RECOVERY_ONLY_MESSAGE: &str =
    "Recovery games are unlocked from the recovery page for eligible users.";

/// Fields are optional so a missing one is a 400 with a readable message
/// instead of a deserialisation failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RecordPurchaseRequest {
    pub user_id: Option<Uuid>,
    pub game_id: Option<i64>,
    pub amount: Option<f64>,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    #[schema(example = "T123456789")]
    pub reference: Option<String>,
    pub user_id: Option<Uuid>,
    pub game_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnlockRequest {
    pub game_id: i64,
}

/// What the client should do when a user taps a locked game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnlockOutcome {
    Revealed {
        booking_code: String,
    },
    SlotFull {
        message: String,
    },
    RecoveryOnly {
        message: String,
    },
    /// Parameters for the hosted checkout widget.
    PaymentRequired {
        game_id: i64,
        amount: f64,
        /// Pesewas.
        amount_minor: i64,
        currency: String,
        public_key: String,
        email: Option<String>,
    },
}

/// Major currency units to the gateway's minor units.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordOutcome {
    pub already_recorded: bool,
    pub message: String,
}

impl RecordOutcome {
    pub fn recorded() -> Self {
        Self {
            already_recorded: false,
            message: "Purchase recorded".to_string(),
        }
    }

    pub fn already_recorded() -> Self {
        Self {
            already_recorded: true,
            message: "Purchase already recorded".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BuyerSummary {
    pub full_name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponse {
    pub id: i64,
    pub user_id: Uuid,
    pub game_id: i64,
    pub amount: f64,
    pub currency: String,
    pub status: PurchaseStatus,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GameResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<BuyerSummary>,
}

impl From<purchase_entity::Model> for PurchaseResponse {
    fn from(m: purchase_entity::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            game_id: m.game_id,
            amount: m.amount,
            currency: m.currency,
            status: m.status,
            payment_reference: m.payment_reference,
            created_at: m.created_at,
            game: None,
            buyer: None,
        }
    }
}
