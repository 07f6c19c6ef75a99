use crate::database::DbPool;
use crate::entities::{GameStatus, GameType, MatchList, game_entity as games};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::purchase_service::owned_game_ids;
use crate::utils::lifecycle::{aggregate_odds, next_status};
use crate::utils::{DayFilter, parse_booking_code, resolve_range};
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

fn parse_game_type(label: &str) -> AppResult<GameType> {
    GameType::from_label(label)
        .ok_or_else(|| AppError::ValidationError(format!("Invalid game type: {label}")))
}

fn validate_amount(name: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::ValidationError(format!(
            "{name} must be a non-negative number"
        )));
    }
    Ok(())
}

/// Builds the row for a new upload. The id is assigned by the store.
pub fn prepare_upload(req: UploadGameRequest, now: DateTime<Utc>) -> AppResult<games::Model> {
    let booking_code = parse_booking_code(&req.booking_code)?;
    let game_type = parse_game_type(&req.game_type)?;

    let price = match (game_type, req.price) {
        (GameType::Free, p) => p.unwrap_or(0.0),
        (_, Some(p)) => p,
        (_, None) => {
            return Err(AppError::ValidationError(
                "Price is required for paid games".to_string(),
            ));
        }
    };
    validate_amount("Price", price)?;

    let total_odds = match req.total_odds {
        Some(t) => {
            validate_amount("Total odds", t)?;
            t
        }
        None => aggregate_odds(&req.matches),
    };

    let game_name = req
        .game_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("{} - {}", game_type.display_name(), booking_code));

    Ok(games::Model {
        id: 0,
        booking_code,
        game_type,
        game_name: Some(game_name),
        match_data: MatchList(req.matches),
        total_odds,
        price,
        status: GameStatus::Pending,
        archived_at: None,
        created_at: now,
        updated_at: Some(now),
    })
}

/// Applies an admin edit and re-derives the status from the edited matches.
pub fn apply_update(
    mut game: games::Model,
    req: UpdateGameRequest,
    now: DateTime<Utc>,
) -> AppResult<games::Model> {
    if let Some(label) = req.game_type.as_deref() {
        game.game_type = parse_game_type(label)?;
    }
    if let Some(name) = req.game_name {
        let name = name.trim().to_string();
        game.game_name = (!name.is_empty()).then_some(name);
    }
    if let Some(matches) = req.matches {
        game.match_data = MatchList(matches);
    }
    if let Some(total_odds) = req.total_odds {
        validate_amount("Total odds", total_odds)?;
        game.total_odds = total_odds;
    }
    if let Some(price) = req.price {
        validate_amount("Price", price)?;
        game.price = price;
    }

    match next_status(game.status, game.match_data.as_slice()) {
        Some(GameStatus::Archived) => {
            game.status = GameStatus::Archived;
            game.archived_at = Some(now);
        }
        Some(status) => game.status = status,
        None => {}
    }
    game.updated_at = Some(now);
    Ok(game)
}

fn into_active(game: games::Model, insert: bool) -> games::ActiveModel {
    games::ActiveModel {
        id: if insert { NotSet } else { Unchanged(game.id) },
        booking_code: Set(game.booking_code),
        game_type: Set(game.game_type),
        game_name: Set(game.game_name),
        match_data: Set(game.match_data),
        total_odds: Set(game.total_odds),
        price: Set(game.price),
        status: Set(game.status),
        archived_at: Set(game.archived_at),
        created_at: Set(game.created_at),
        updated_at: Set(game.updated_at),
    }
}

#[derive(Clone)]
pub struct GameService {
    pool: DbPool,
    retention_days: i64,
}

impl GameService {
    pub fn new(pool: DbPool, retention_days: i64) -> Self {
        Self {
            pool,
            retention_days,
        }
    }

    async fn find(&self, game_id: i64) -> AppResult<games::Model> {
        games::Entity::find_by_id(game_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))
    }

    pub async fn upload(&self, req: UploadGameRequest) -> AppResult<GameResponse> {
        let game = prepare_upload(req, Utc::now())?;
        let saved = into_active(game, true).insert(self.pool.as_ref()).await?;
        log::info!(
            "Game {} uploaded: {} ({}) odds={}",
            saved.id,
            saved.booking_code,
            saved.game_type,
            saved.total_odds
        );
        Ok(GameResponse::revealed(saved))
    }

    /// All games newest first, flagged with the caller's ownership.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        is_admin: bool,
    ) -> AppResult<Vec<GameResponse>> {
        let models = games::Entity::find()
            .order_by_desc(games::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;
        let owned = owned_game_ids(self.pool.as_ref(), user_id).await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let purchased = owned.contains(&m.id);
                GameResponse::from_model(m, purchased, is_admin)
            })
            .collect())
    }

    pub async fn get_for_user(
        &self,
        game_id: i64,
        user_id: Uuid,
        is_admin: bool,
    ) -> AppResult<GameResponse> {
        let game = self.find(game_id).await?;
        let purchased = owned_game_ids(self.pool.as_ref(), user_id)
            .await?
            .contains(&game.id);
        Ok(GameResponse::from_model(game, purchased, is_admin))
    }

    pub async fn update(&self, game_id: i64, req: UpdateGameRequest) -> AppResult<GameResponse> {
        let current = self.find(game_id).await?;
        let previous = current.status;
        let edited = apply_update(current, req, Utc::now())?;
        let saved = into_active(edited, false).update(self.pool.as_ref()).await?;
        if saved.status != previous {
            log::info!("Game {} moved {previous} -> {}", saved.id, saved.status);
        }
        Ok(GameResponse::revealed(saved))
    }

    pub async fn delete(&self, game_id: i64) -> AppResult<()> {
        let res = games::Entity::delete_by_id(game_id)
            .exec(self.pool.as_ref())
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Game not found".to_string()));
        }
        log::info!("Game {game_id} deleted");
        Ok(())
    }

    pub async fn predictions(
        &self,
        user_id: Uuid,
        is_admin: bool,
        query: &PredictionQuery,
    ) -> AppResult<Vec<GameResponse>> {
        let type_filter = query.game_type.unwrap_or_default();
        let range = resolve_range(
            query.day.unwrap_or(DayFilter::Today),
            query.date,
            Utc::now(),
        );

        let mut select = games::Entity::find()
            .filter(games::Column::GameType.is_in(type_filter.game_types()));
        if let Some(start) = range.start {
            select = select.filter(games::Column::CreatedAt.gte(start));
        }
        if let Some(end) = range.end {
            select = select.filter(games::Column::CreatedAt.lt(end));
        }
        let models = select
            .order_by_desc(games::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;
        let owned = owned_game_ids(self.pool.as_ref(), user_id).await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let purchased = owned.contains(&m.id);
                GameResponse::from_model(m, purchased, is_admin)
            })
            .collect())
    }

    pub async fn archived(&self, search: Option<&str>) -> AppResult<Vec<ArchivedGameResponse>> {
        let now = Utc::now();
        let models = games::Entity::find()
            .filter(games::Column::Status.eq(GameStatus::Archived))
            .order_by_desc(games::Column::ArchivedAt)
            .all(self.pool.as_ref())
            .await?;
        Ok(models
            .into_iter()
            .filter(|m| search.is_none_or(|s| matches_archive_search(m, s)))
            .map(|m| ArchivedGameResponse::new(m, now, self.retention_days))
            .collect())
    }

    /// Brings an archived game back. A fully resolved slip is archived again on the next reconcile.
    pub async fn restore(&self, game_id: i64) -> AppResult<GameResponse> {
        let mut game = self.find(game_id).await?;
        if game.status != GameStatus::Archived {
            return Err(AppError::ValidationError(
                "Game is not archived".to_string(),
            ));
        }
        game.status = GameStatus::Active;
        game.archived_at = None;
        game.updated_at = Some(Utc::now());

        let saved = into_active(game, false).update(self.pool.as_ref()).await?;
        log::info!("Game {} restored", saved.id);
        Ok(GameResponse::revealed(saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Match, MatchStatus};
    use crate::services::LifecycleService;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn pending(odds: &str) -> Match {
        Match {
            event_id: None,
            home_team: "Home".into(),
            away_team: "Away".into(),
            league: None,
            status: MatchStatus::Pending,
            odds: odds.into(),
            market_desc: None,
        }
    }

    fn upload(code: &str, game_type: &str, price: Option<f64>) -> UploadGameRequest {
        UploadGameRequest {
            booking_code: code.to_string(),
            game_type: game_type.to_string(),
            game_name: None,
            matches: vec![pending("1.8"), pending("2.1"), pending("1.5")],
            total_odds: None,
            price,
        }
    }

    #[test]
    fn test_prepare_upload_defaults() {
        let game = prepare_upload(upload(" abc123 ", "VIP", Some(20.0)), Utc::now()).unwrap();
        assert_eq!(game.booking_code, "ABC123");
        assert_eq!(game.game_type, GameType::Vip);
        assert_eq!(game.total_odds, 5.67);
        assert_eq!(game.status, GameStatus::Pending);
        assert_eq!(game.game_name.as_deref(), Some("VIP - ABC123"));

        let free = prepare_upload(upload("FREE01", "free", None), Utc::now()).unwrap();
        assert_eq!(free.price, 0.0);
    }

    #[test]
    fn test_prepare_upload_rejects_bad_input() {
        assert!(prepare_upload(upload("ABC123", "platinum", Some(5.0)), Utc::now()).is_err());
        assert!(prepare_upload(upload("ABC123", "vip", None), Utc::now()).is_err());
        assert!(prepare_upload(upload("ABC123", "vip", Some(-1.0)), Utc::now()).is_err());
        assert!(prepare_upload(upload("", "vip", Some(5.0)), Utc::now()).is_err());
    }

    #[test]
    fn test_total_odds_override_is_kept() {
        let mut req = upload("ABC123", "vip", Some(20.0));
        req.total_odds = Some(6.0);
        assert_eq!(prepare_upload(req, Utc::now()).unwrap().total_odds, 6.0);
    }

    #[test]
    fn test_apply_update_reclassifies() {
        let now = Utc::now();
        let game = prepare_upload(upload("ABC123", "vip", Some(20.0)), now).unwrap();

        let partial = UpdateGameRequest {
            matches: Some(vec![
                Match { status: MatchStatus::Won, ..pending("1.8") },
                pending("2.1"),
                pending("1.5"),
            ]),
            ..Default::default()
        };
        let active = apply_update(game, partial, now).unwrap();
        assert_eq!(active.status, GameStatus::Active);
        assert!(active.archived_at.is_none());
        // total odds are not recomputed on edit
        assert_eq!(active.total_odds, 5.67);

        let settled = UpdateGameRequest {
            matches: Some(vec![
                Match { status: MatchStatus::Won, ..pending("1.8") },
                Match { status: MatchStatus::Won, ..pending("2.1") },
                Match { status: MatchStatus::Won, ..pending("1.5") },
            ]),
            ..Default::default()
        };
        let archived = apply_update(active, settled, now).unwrap();
        assert_eq!(archived.status, GameStatus::Archived);
        assert_eq!(archived.archived_at, Some(now));
    }

    #[test]
    fn test_apply_update_leaves_archived_alone() {
        let now = Utc::now();
        let mut game = prepare_upload(upload("ABC123", "vip", Some(20.0)), now).unwrap();
        game.status = GameStatus::Archived;
        game.archived_at = Some(now - Duration::days(1));

        let edit = UpdateGameRequest {
            price: Some(25.0),
            ..Default::default()
        };
        let edited = apply_update(game, edit, now).unwrap();
        assert_eq!(edited.status, GameStatus::Archived);
        assert_eq!(edited.archived_at, Some(now - Duration::days(1)));
        assert_eq!(edited.price, 25.0);
    }

    #[tokio::test]
    async fn test_delete_missing_game_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let svc = GameService::new(Arc::new(db), 3);
        assert!(matches!(svc.delete(42).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_archived_search_filters_rows() {
        let now = Utc::now();
        let mut game = prepare_upload(upload("ABC123", "vip", Some(20.0)), now).unwrap();
        game.status = GameStatus::Archived;
        game.archived_at = Some(now - Duration::days(1));
        let other = games::Model {
            id: 2,
            booking_code: "ZZZ999".to_string(),
            ..game.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![games::Model { id: 1, ..game }, other]])
            .into_connection();
        let svc = GameService::new(Arc::new(db), 3);

        let found = svc.archived(Some("abc")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].game.booking_code.as_deref(), Some("ABC123"));
        assert_eq!(found[0].archived_days_ago, 1);
    }

    #[tokio::test]
    async fn test_restore_requires_archived() {
        let game = prepare_upload(upload("ABC123", "vip", Some(20.0)), Utc::now()).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![games::Model { id: 9, ..game }]])
            .into_connection();
        let svc = GameService::new(Arc::new(db), 3);
        assert!(matches!(
            svc.restore(9).await,
            Err(AppError::ValidationError(_))
        ));
    }

    /// Upload, settle every match, then age past the retention window.
    #[tokio::test]
    async fn test_game_lifecycle_scenario() {
        let uploaded_at = Utc::now();
        let uploaded = prepare_upload(upload("ABC123", "vip", Some(20.0)), uploaded_at).unwrap();
        assert_eq!(uploaded.total_odds, 5.67);
        assert_eq!(uploaded.status, GameStatus::Pending);
        let uploaded = games::Model { id: 1, ..uploaded };

        let settle = UpdateGameRequest {
            matches: Some(
                uploaded
                    .match_data
                    .as_slice()
                    .iter()
                    .cloned()
                    .map(|m| Match { status: MatchStatus::Won, ..m })
                    .collect(),
            ),
            ..Default::default()
        };
        let settled = apply_update(uploaded.clone(), settle.clone(), uploaded_at).unwrap();
        assert_eq!(settled.status, GameStatus::Archived);
        assert_eq!(settled.archived_at, Some(uploaded_at));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // find, then UPDATE .. RETURNING
            .append_query_results([vec![uploaded.clone()], vec![settled.clone()]])
            .append_query_results([Vec::<games::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let db = Arc::new(db);

        let svc = GameService::new(db.clone(), 3);
        let response = svc.update(1, settle).await.unwrap();
        assert_eq!(response.status, GameStatus::Archived);
        assert!(response.archived_at.is_some());

        let report = LifecycleService::new(db, 3)
            .reconcile_at(uploaded_at + Duration::days(4))
            .await;
        assert_eq!(report.deleted, 1);
    }
}
