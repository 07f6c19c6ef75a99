use crate::database::DbPool;
use crate::entities::{GameType, Match, game_entity as games, purchase_entity as purchases};
use crate::error::AppResult;
use crate::models::{GameResponse, RecoveryResponse};
use crate::utils::lifecycle::has_loss;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use std::collections::HashMap;
use uuid::Uuid;

/// How far back a user's purchase history is scanned for a losing slip.
pub const RECOVERY_SCAN_LIMIT: u64 = 50;

/// Walks purchases newest first; the first one whose game lost sets the watermark.
///
/// Purchases whose game no longer exists are skipped.
pub fn eligibility_watermark(
    purchases_desc: &[purchases::Model],
    matches_by_game: &HashMap<i64, Vec<Match>>,
) -> Option<DateTime<Utc>> {
    purchases_desc
        .iter()
        .find(|p| {
            matches_by_game
                .get(&p.game_id)
                .is_some_and(|matches| has_loss(matches))
        })
        .map(|p| p.created_at)
}

#[derive(Clone)]
pub struct RecoveryService {
    pool: DbPool,
}

impl RecoveryService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn check(&self, user_id: Uuid) -> AppResult<Option<DateTime<Utc>>> {
        let recent = purchases::Entity::find()
            .filter(purchases::Column::UserId.eq(user_id))
            .order_by_desc(purchases::Column::CreatedAt)
            .limit(RECOVERY_SCAN_LIMIT)
            .all(self.pool.as_ref())
            .await?;
        if recent.is_empty() {
            return Ok(None);
        }

        let ids: Vec<i64> = recent.iter().map(|p| p.game_id).collect();
        let matches_by_game: HashMap<i64, Vec<Match>> = games::Entity::find()
            .filter(games::Column::Id.is_in(ids))
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|g| (g.id, g.match_data.0))
            .collect();

        Ok(eligibility_watermark(&recent, &matches_by_game))
    }

    pub async fn recovery_games(&self, user_id: Uuid) -> AppResult<RecoveryResponse> {
        let Some(since) = self.check(user_id).await? else {
            return Ok(RecoveryResponse::ineligible());
        };

        let games = games::Entity::find()
            .filter(games::Column::GameType.eq(GameType::Recovery))
            .filter(games::Column::CreatedAt.gte(since))
            .order_by_desc(games::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;

        Ok(RecoveryResponse {
            eligible: true,
            eligible_since: Some(since),
            games: games.into_iter().map(GameResponse::revealed).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{GameStatus, MatchList, MatchStatus, PurchaseStatus};
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn outcome(status: MatchStatus) -> Match {
        Match {
            event_id: None,
            home_team: "Home".into(),
            away_team: "Away".into(),
            league: None,
            status,
            odds: "2.00".into(),
            market_desc: None,
        }
    }

    fn purchase(game_id: i64, created_at: DateTime<Utc>) -> purchases::Model {
        purchases::Model {
            id: game_id,
            user_id: Uuid::nil(),
            game_id,
            amount: 10.0,
            currency: "GHS".into(),
            status: PurchaseStatus::Paid,
            payment_reference: None,
            created_at,
        }
    }

    fn game(
        id: i64,
        game_type: GameType,
        matches: Vec<Match>,
        created_at: DateTime<Utc>,
    ) -> games::Model {
        games::Model {
            id,
            booking_code: format!("REC{id:03}"),
            game_type,
            game_name: None,
            match_data: MatchList(matches),
            total_odds: 2.0,
            price: 0.0,
            status: GameStatus::Active,
            archived_at: None,
            created_at,
            updated_at: None,
        }
    }

    #[test]
    fn test_watermark_is_most_recent_losing_purchase() {
        let now = Utc::now();
        let purchases = vec![
            purchase(3, now),
            purchase(2, now - Duration::days(1)),
            purchase(1, now - Duration::days(2)),
        ];
        let matches = HashMap::from([
            (3, vec![outcome(MatchStatus::Won)]),
            (2, vec![outcome(MatchStatus::Won), outcome(MatchStatus::Lost)]),
            (1, vec![outcome(MatchStatus::Lost)]),
        ]);
        assert_eq!(
            eligibility_watermark(&purchases, &matches),
            Some(now - Duration::days(1))
        );
    }

    #[test]
    fn test_no_loss_or_missing_game_is_ineligible() {
        let now = Utc::now();
        assert_eq!(eligibility_watermark(&[], &HashMap::new()), None);

        let purchases = vec![purchase(1, now), purchase(2, now)];
        let matches = HashMap::from([(1, vec![outcome(MatchStatus::Pending)])]);
        assert_eq!(eligibility_watermark(&purchases, &matches), None);
    }

    #[tokio::test]
    async fn test_user_without_purchases_gets_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<purchases::Model>::new()])
            .into_connection();
        let response = RecoveryService::new(Arc::new(db))
            .recovery_games(Uuid::nil())
            .await
            .unwrap();
        assert!(!response.eligible);
        assert!(response.games.is_empty());
    }

    #[tokio::test]
    async fn test_losing_purchase_unlocks_recovery_games() {
        let bought_at = Utc::now() - Duration::hours(5);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![purchase(1, bought_at)]])
            .append_query_results([vec![game(
                1,
                GameType::Vip,
                vec![outcome(MatchStatus::Won), outcome(MatchStatus::Lost)],
                bought_at,
            )]])
            .append_query_results([vec![game(
                8,
                GameType::Recovery,
                vec![outcome(MatchStatus::Pending)],
                bought_at + Duration::hours(1),
            )]])
            .into_connection();

        let response = RecoveryService::new(Arc::new(db))
            .recovery_games(Uuid::nil())
            .await
            .unwrap();
        assert!(response.eligible);
        assert_eq!(response.eligible_since, Some(bought_at));
        assert_eq!(response.games.len(), 1);
        assert_eq!(response.games[0].booking_code.as_deref(), Some("REC008"));
    }
}
