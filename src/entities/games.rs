use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter, FromJsonQueryResult};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    #[sea_orm(string_value = "free")]
    Free,
    #[sea_orm(string_value = "vip")]
    Vip,
    #[sea_orm(string_value = "correct_score")]
    #[serde(alias = "correct score", alias = "correct-score")]
    CorrectScore,
    #[sea_orm(string_value = "custom_vip")]
    #[serde(alias = "custom vip", alias = "custom-vip")]
    CustomVip,
    #[sea_orm(string_value = "custom_correct_score")]
    #[serde(alias = "custom correct score", alias = "custom-correct-score")]
    CustomCorrectScore,
    #[sea_orm(string_value = "recovery")]
    Recovery,
}

impl GameType {
    /// Lenient parse of admin-facing labels ("Custom VIP", "correct-score", ...).
    pub fn from_label(label: &str) -> Option<Self> {
        let t = label.trim().to_lowercase().replace(['-', '_'], " ");
        if t.contains("custom vip") {
            Some(GameType::CustomVip)
        } else if t.contains("custom correct") {
            Some(GameType::CustomCorrectScore)
        } else if t.contains("recovery") {
            Some(GameType::Recovery)
        } else if t.contains("correct score") {
            Some(GameType::CorrectScore)
        } else if t == "vip" {
            Some(GameType::Vip)
        } else if t == "free" {
            Some(GameType::Free)
        } else {
            None
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, GameType::CustomVip | GameType::CustomCorrectScore)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GameType::Free => "FREE",
            GameType::Vip => "VIP",
            GameType::CorrectScore => "CORRECT SCORE",
            GameType::CustomVip => "CUSTOM VIP",
            GameType::CustomCorrectScore => "CUSTOM CORRECT SCORE",
            GameType::Recovery => "RECOVERY",
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameType::Free => write!(f, "free"),
            GameType::Vip => write!(f, "vip"),
            GameType::CorrectScore => write!(f, "correct_score"),
            GameType::CustomVip => write!(f, "custom_vip"),
            GameType::CustomCorrectScore => write!(f, "custom_correct_score"),
            GameType::Recovery => write!(f, "recovery"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "archived")]
    Archived,
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Pending => write!(f, "pending"),
            GameStatus::Active => write!(f, "active"),
            GameStatus::Archived => write!(f, "archived"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Won,
    Lost,
}

impl MatchStatus {
    /// Anything that is not a recognisable win/loss is still pending.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "won" | "win" => MatchStatus::Won,
            "lost" | "loss" => MatchStatus::Lost,
            _ => MatchStatus::Pending,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, MatchStatus::Pending)
    }
}

impl<'de> Deserialize<'de> for MatchStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(MatchStatus::from_label)
            .unwrap_or_default())
    }
}

pub const ODDS_NOT_AVAILABLE: &str = "N/A";

fn default_odds() -> String {
    ODDS_NOT_AVAILABLE.to_string()
}

// Bookmakers send odds as strings, admins as numbers.
fn deserialize_odds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => default_odds(),
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    #[serde(default)]
    pub event_id: Option<String>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default = "default_odds", deserialize_with = "deserialize_odds")]
    #[schema(example = "1.85")]
    pub odds: String,
    #[serde(default)]
    pub market_desc: Option<String>,
}

impl Match {
    /// Positive decimal odds, or `None` for "N/A" and garbage.
    pub fn parsed_odds(&self) -> Option<f64> {
        self.odds
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct MatchList(pub Vec<Match>);

impl MatchList {
    pub fn as_slice(&self) -> &[Match] {
        &self.0
    }
}

impl From<Vec<Match>> for MatchList {
    fn from(matches: Vec<Match>) -> Self {
        Self(matches)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "games")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub booking_code: String,
    pub game_type: GameType,
    pub game_name: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub match_data: MatchList,
    pub total_odds: f64,
    pub price: f64,
    pub status: GameStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
