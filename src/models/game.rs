use crate::entities::{GameStatus, GameType, Match, game_entity};
use crate::utils::DayFilter;
use crate::utils::lifecycle::{StatusCounts, days_since, is_deletion_eligible, status_counts};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadGameRequest {
    #[schema(example = "ABC123")]
    pub booking_code: String,
    /// Lenient label, e.g. "VIP", "Custom Correct Score".
    #[schema(example = "vip")]
    pub game_type: String,
    pub game_name: Option<String>,
    #[serde(default)]
    pub matches: Vec<Match>,
    /// Defaults to the product of the match odds.
    pub total_odds: Option<f64>,
    #[schema(example = 20.0)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateGameRequest {
    pub game_type: Option<String>,
    pub game_name: Option<String>,
    pub matches: Option<Vec<Match>>,
    pub total_odds: Option<f64>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GameResponse {
    pub id: i64,
    /// Hidden until the caller may see it.
    pub booking_code: Option<String>,
    pub locked: bool,
    pub game_type: GameType,
    pub game_type_label: String,
    pub game_name: Option<String>,
    pub matches: Vec<Match>,
    pub total_odds: f64,
    pub price: f64,
    pub status: GameStatus,
    pub status_counts: StatusCounts,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub purchased: bool,
}

impl GameResponse {
    pub fn from_model(m: game_entity::Model, purchased: bool, reveal: bool) -> Self {
        let visible = reveal || purchased || m.game_type == GameType::Free;
        let matches = m.match_data.0;
        Self {
            id: m.id,
            booking_code: visible.then_some(m.booking_code),
            locked: !visible,
            game_type: m.game_type,
            game_type_label: m.game_type.display_name().to_string(),
            game_name: m.game_name,
            status_counts: status_counts(&matches),
            matches,
            total_odds: m.total_odds,
            price: m.price,
            status: m.status,
            archived_at: m.archived_at,
            created_at: m.created_at,
            purchased,
        }
    }

    pub fn revealed(m: game_entity::Model) -> Self {
        Self::from_model(m, false, true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArchivedGameResponse {
    #[serde(flatten)]
    pub game: GameResponse,
    pub archived_days_ago: i64,
    pub deletion_eligible: bool,
}

impl ArchivedGameResponse {
    pub fn new(m: game_entity::Model, now: DateTime<Utc>, retention_days: i64) -> Self {
        let archived_days_ago = m.archived_at.map(|at| days_since(at, now)).unwrap_or(0);
        let deletion_eligible = is_deletion_eligible(m.archived_at, now, retention_days);
        Self {
            game: GameResponse::revealed(m),
            archived_days_ago,
            deletion_eligible,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ArchivedQuery {
    /// Case-insensitive search over booking code, game name and type.
    pub q: Option<String>,
}

/// A blank search matches every archived game.
pub fn matches_archive_search(m: &game_entity::Model, search: &str) -> bool {
    let term = search.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    m.booking_code.to_lowercase().contains(&term)
        || m.game_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&term))
        || m.game_type
            .to_string()
            .contains(&term.replace([' ', '-'], "_"))
}

/// Type tabs on the predictions screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TypeFilter {
    #[default]
    All,
    Free,
    Vip,
    CorrectScore,
    Custom,
    Recovery,
}

impl TypeFilter {
    pub fn matches(&self, game_type: GameType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Free => game_type == GameType::Free,
            TypeFilter::Vip => matches!(game_type, GameType::Vip | GameType::CustomVip),
            TypeFilter::CorrectScore => matches!(
                game_type,
                GameType::CorrectScore | GameType::CustomCorrectScore
            ),
            TypeFilter::Custom => game_type.is_custom(),
            TypeFilter::Recovery => game_type == GameType::Recovery,
        }
    }

    pub fn game_types(&self) -> Vec<GameType> {
        use sea_orm::Iterable;
        GameType::iter().filter(|t| self.matches(*t)).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PredictionQuery {
    #[serde(rename = "type")]
    pub game_type: Option<TypeFilter>,
    pub day: Option<DayFilter>,
    /// YYYY-MM-DD, overrides `day`.
    #[schema(value_type = Option<String>, example = "2025-10-19")]
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{MatchList, MatchStatus};

    fn model(game_type: GameType) -> game_entity::Model {
        game_entity::Model {
            id: 7,
            booking_code: "ABC123".to_string(),
            game_type,
            game_name: None,
            match_data: MatchList(vec![Match {
                event_id: None,
                home_team: "Arsenal".to_string(),
                away_team: "Chelsea".to_string(),
                league: None,
                status: MatchStatus::Won,
                odds: "1.80".to_string(),
                market_desc: None,
            }]),
            total_odds: 1.8,
            price: 20.0,
            status: GameStatus::Active,
            archived_at: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_booking_code_masked_until_owned() {
        let locked = GameResponse::from_model(model(GameType::Vip), false, false);
        assert!(locked.booking_code.is_none());
        assert!(locked.locked);
        assert_eq!(locked.status_counts.won, 1);

        let owned = GameResponse::from_model(model(GameType::Vip), true, false);
        assert_eq!(owned.booking_code.as_deref(), Some("ABC123"));

        let free = GameResponse::from_model(model(GameType::Free), false, false);
        assert_eq!(free.booking_code.as_deref(), Some("ABC123"));
        assert!(!free.locked);
    }

    #[test]
    fn test_archive_search() {
        let mut game = model(GameType::CustomVip);
        game.game_name = Some("Weekend Banker".to_string());

        assert!(matches_archive_search(&game, ""));
        assert!(matches_archive_search(&game, "  "));
        assert!(matches_archive_search(&game, "abc1"));
        assert!(matches_archive_search(&game, "banker"));
        assert!(matches_archive_search(&game, "Custom VIP"));
        assert!(!matches_archive_search(&game, "recovery"));
        assert!(!matches_archive_search(&game, "XYZ"));
    }

    #[test]
    fn test_type_filter_groups() {
        assert!(TypeFilter::Vip.matches(GameType::CustomVip));
        assert!(!TypeFilter::Vip.matches(GameType::CorrectScore));
        assert!(TypeFilter::CorrectScore.matches(GameType::CustomCorrectScore));
        assert!(TypeFilter::Custom.matches(GameType::CustomVip));
        assert!(!TypeFilter::Custom.matches(GameType::Vip));
        assert_eq!(TypeFilter::All.game_types().len(), 6);
        assert_eq!(
            TypeFilter::Recovery.game_types(),
            vec![GameType::Recovery]
        );
    }

    #[test]
    fn test_prediction_query_parses_type_key() {
        let q: PredictionQuery =
            serde_json::from_str(r#"{"type":"correct_score","day":"yesterday"}"#).unwrap();
        assert_eq!(q.game_type, Some(TypeFilter::CorrectScore));
        assert_eq!(q.day, Some(DayFilter::Yesterday));
        assert!(q.date.is_none());
    }
}
