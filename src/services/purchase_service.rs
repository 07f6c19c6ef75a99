use crate::database::DbPool;
use crate::entities::{
    GameType, PurchaseStatus, game_entity as games, profile_entity as profiles,
    purchase_entity as purchases,
};
use crate::error::{AppError, AppResult};
use crate::external::{PaystackService, TransactionData};
use crate::models::*;
use crate::utils::AuthUser;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Ids of every game the user has a purchase for.
pub async fn owned_game_ids<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> AppResult<HashSet<i64>> {
    let rows = purchases::Entity::find()
        .filter(purchases::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|p| p.game_id).collect())
}

/// Decides what tapping a game does for a user. Ownership wins over every type rule.
pub fn decide_unlock(
    game: &games::Model,
    owned: bool,
    payment: &PaystackService,
    email: Option<String>,
) -> UnlockOutcome {
    if owned || game.game_type == GameType::Free {
        return UnlockOutcome::Revealed {
            booking_code: game.booking_code.clone(),
        };
    }
    match game.game_type {
        t if t.is_custom() => UnlockOutcome::SlotFull {
            message: SLOT_FULL_MESSAGE.to_string(),
        },
        GameType::Recovery => UnlockOutcome::RecoveryOnly {
            message: RECOVERY_ONLY_MESSAGE.to_string(),
        },
        _ => UnlockOutcome::PaymentRequired {
            game_id: game.id,
            amount: game.price,
            amount_minor: to_minor_units(game.price),
            currency: payment.currency().to_string(),
            public_key: payment.public_key().to_string(),
            email,
        },
    }
}

/// A verified charge pays for `game` only when it covers the price.
pub fn check_charge_covers(transaction: &TransactionData, game: &games::Model) -> AppResult<()> {
    let expected_minor = to_minor_units(game.price);
    if transaction.amount < expected_minor {
        log::warn!(
            "Payment {} amount {} is below game {} price {}",
            transaction.reference,
            transaction.amount,
            game.id,
            expected_minor
        );
        return Err(AppError::ValidationError(
            "Payment amount does not cover the game price.".to_string(),
        ));
    }
    if transaction.amount > expected_minor {
        log::warn!(
            "Payment {} amount {} exceeds game {} price {}",
            transaction.reference,
            transaction.amount,
            game.id,
            expected_minor
        );
    }
    Ok(())
}

/// A captured payment (or admin grant) to persist as a paid purchase.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub user_id: Uuid,
    pub game_id: i64,
    pub amount: f64,
    pub currency: String,
    pub payment_reference: Option<String>,
}

#[derive(Clone)]
pub struct PurchaseService {
    pool: DbPool,
    paystack: PaystackService,
}

impl PurchaseService {
    pub fn new(pool: DbPool, paystack: PaystackService) -> Self {
        Self { pool, paystack }
    }

    pub fn payment_configured(&self) -> bool {
        self.paystack.is_configured()
    }

    async fn find_game(&self, game_id: i64) -> AppResult<games::Model> {
        games::Entity::find_by_id(game_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))
    }

    pub async fn has_purchase(&self, user_id: Uuid, game_id: i64) -> AppResult<bool> {
        let existing = purchases::Entity::find()
            .filter(purchases::Column::UserId.eq(user_id))
            .filter(purchases::Column::GameId.eq(game_id))
            .one(self.pool.as_ref())
            .await?;
        Ok(existing.is_some())
    }

    /// A payment reference pays for exactly one `(user_id, game_id)`.
    async fn ensure_reference_unused(
        &self,
        reference: &str,
        user_id: Uuid,
        game_id: i64,
    ) -> AppResult<()> {
        let existing = purchases::Entity::find()
            .filter(purchases::Column::PaymentReference.eq(reference))
            .one(self.pool.as_ref())
            .await?;

        match existing {
            Some(p) if p.user_id != user_id || p.game_id != game_id => {
                log::warn!(
                    "Payment reference {reference} already used by user={} game={}",
                    p.user_id,
                    p.game_id
                );
                Err(AppError::ValidationError(
                    "Payment reference has already been used.".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    pub async fn unlock(&self, user: &AuthUser, game_id: i64) -> AppResult<UnlockOutcome> {
        let game = self.find_game(game_id).await?;
        let owned = self.has_purchase(user.id, game_id).await?;
        Ok(decide_unlock(&game, owned, &self.paystack, user.email.clone()))
    }

    /// Idempotent on `(user_id, game_id)`: the existence check is a fast path,
    /// the unique index settles races.
    pub async fn record_purchase(&self, purchase: NewPurchase) -> AppResult<RecordOutcome> {
        if self.has_purchase(purchase.user_id, purchase.game_id).await? {
            return Ok(RecordOutcome::already_recorded());
        }

        let row = purchases::ActiveModel {
            id: NotSet,
            user_id: Set(purchase.user_id),
            game_id: Set(purchase.game_id),
            amount: Set(purchase.amount),
            currency: Set(purchase.currency),
            status: Set(PurchaseStatus::Paid),
            payment_reference: Set(purchase.payment_reference),
            created_at: Set(Utc::now()),
        };
        let inserted = purchases::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([purchases::Column::UserId, purchases::Column::GameId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.pool.as_ref())
            .await?;

        if inserted == 0 {
            return Ok(RecordOutcome::already_recorded());
        }
        log::info!(
            "Purchase recorded: user={} game={}",
            purchase.user_id,
            purchase.game_id
        );
        Ok(RecordOutcome::recorded())
    }

    /// Admin grant without a payment.
    pub async fn grant(&self, req: RecordPurchaseRequest) -> AppResult<RecordOutcome> {
        let (Some(user_id), Some(game_id)) = (req.user_id, req.game_id) else {
            return Err(AppError::ValidationError(
                "user_id and game_id are required".to_string(),
            ));
        };
        let game = self.find_game(game_id).await?;
        let amount = req.amount.unwrap_or(game.price);
        if let Some(reference) = req.payment_reference.as_deref() {
            self.ensure_reference_unused(reference, user_id, game_id).await?;
        }

        self.record_purchase(NewPurchase {
            user_id,
            game_id,
            amount,
            currency: self.paystack.currency().to_string(),
            payment_reference: req.payment_reference,
        })
        .await
    }

    /// Confirms a checkout reference with the gateway and records the entitlement.
    ///
    /// Only admins may record on behalf of another user.
    pub async fn verify_and_record(
        &self,
        caller: &AuthUser,
        caller_is_admin: bool,
        req: VerifyPaymentRequest,
    ) -> AppResult<RecordOutcome> {
        let (Some(reference), Some(user_id), Some(game_id)) =
            (req.reference.filter(|r| !r.trim().is_empty()), req.user_id, req.game_id)
        else {
            return Err(AppError::ValidationError(
                "reference, user_id and game_id are required".to_string(),
            ));
        };
        if user_id != caller.id && !caller_is_admin {
            return Err(AppError::Forbidden);
        }

        let reference = reference.trim();
        let game = self.find_game(game_id).await?;
        self.ensure_reference_unused(reference, user_id, game_id).await?;

        let transaction = self
            .paystack
            .verify_transaction(reference)
            .await?
            .ok_or_else(|| AppError::ValidationError("Payment verification failed.".to_string()))?;
        check_charge_covers(&transaction, &game)?;

        self.record_verified(NewPurchase {
            user_id,
            game_id,
            amount: game.price,
            currency: transaction
                .currency
                .unwrap_or_else(|| self.paystack.currency().to_string()),
            payment_reference: Some(transaction.reference),
        })
        .await
    }

    /// Money has moved by now, so any storage failure is surfaced as a support case.
    pub async fn record_verified(&self, purchase: NewPurchase) -> AppResult<RecordOutcome> {
        let reference = purchase.payment_reference.clone().unwrap_or_default();
        self.record_purchase(purchase)
            .await
            .map_err(|e| AppError::EntitlementNotRecorded {
                reference,
                reason: e.to_string(),
            })
    }

    async fn games_by_id(
        &self,
        ids: impl IntoIterator<Item = i64>,
    ) -> AppResult<HashMap<i64, games::Model>> {
        let ids: Vec<i64> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = games::Entity::find()
            .filter(games::Column::Id.is_in(ids))
            .all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(|g| (g.id, g)).collect())
    }

    async fn buyers_by_id(
        &self,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> AppResult<HashMap<Uuid, profiles::Model>> {
        let ids: Vec<Uuid> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = profiles::Entity::find()
            .filter(profiles::Column::Id.is_in(ids))
            .all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(|p| (p.id, p)).collect())
    }

    /// The user's purchases with the bought games' codes revealed.
    pub async fn list_user_purchases(&self, user_id: Uuid) -> AppResult<Vec<PurchaseResponse>> {
        let rows = purchases::Entity::find()
            .filter(purchases::Column::UserId.eq(user_id))
            .order_by_desc(purchases::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;
        let mut games = self.games_by_id(rows.iter().map(|p| p.game_id)).await?;

        Ok(rows
            .into_iter()
            .map(|p| {
                let game = games
                    .remove(&p.game_id)
                    .map(|g| GameResponse::from_model(g, true, true));
                PurchaseResponse {
                    game,
                    ..PurchaseResponse::from(p)
                }
            })
            .collect())
    }

    async fn decorate(&self, rows: Vec<purchases::Model>) -> AppResult<Vec<PurchaseResponse>> {
        let games = self.games_by_id(rows.iter().map(|p| p.game_id)).await?;
        let buyers = self.buyers_by_id(rows.iter().map(|p| p.user_id)).await?;

        Ok(rows
            .into_iter()
            .map(|p| {
                let game = games
                    .get(&p.game_id)
                    .cloned()
                    .map(GameResponse::revealed);
                let buyer = buyers.get(&p.user_id).map(|b| BuyerSummary {
                    full_name: b.full_name.clone(),
                    email: b.email.clone(),
                });
                PurchaseResponse {
                    game,
                    buyer,
                    ..PurchaseResponse::from(p)
                }
            })
            .collect())
    }

    pub async fn list_all(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<PurchaseResponse>> {
        let total = purchases::Entity::find().count(self.pool.as_ref()).await?;
        let rows = purchases::Entity::find()
            .order_by_desc(purchases::Column::CreatedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(self.pool.as_ref())
            .await?;
        let items = self.decorate(rows).await?;

        Ok(PaginatedResponse::new(
            items,
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }

    pub async fn recent_purchases(&self, limit: u64) -> AppResult<Vec<PurchaseResponse>> {
        let rows = purchases::Entity::find()
            .order_by_desc(purchases::Column::CreatedAt)
            .limit(limit)
            .all(self.pool.as_ref())
            .await?;
        self.decorate(rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaystackConfig;
    use crate::entities::{GameStatus, MatchList};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn paystack() -> PaystackService {
        PaystackService::new(PaystackConfig {
            secret_key: "sk_test".to_string(),
            public_key: "pk_test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            currency: "GHS".to_string(),
        })
    }

    fn game(id: i64, game_type: GameType, price: f64) -> games::Model {
        games::Model {
            id,
            booking_code: "ABC123".to_string(),
            game_type,
            game_name: None,
            match_data: MatchList::default(),
            total_odds: 2.0,
            price,
            status: GameStatus::Active,
            archived_at: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn purchase(user_id: Uuid, game_id: i64) -> purchases::Model {
        purchases::Model {
            id: 1,
            user_id,
            game_id,
            amount: 20.0,
            currency: "GHS".to_string(),
            status: PurchaseStatus::Paid,
            payment_reference: Some("T1".to_string()),
            created_at: Utc::now(),
        }
    }

    fn new_purchase(user_id: Uuid) -> NewPurchase {
        NewPurchase {
            user_id,
            game_id: 1,
            amount: 20.0,
            currency: "GHS".to_string(),
            payment_reference: Some("T1".to_string()),
        }
    }

    #[test]
    fn test_decide_unlock_rules() {
        let ps = paystack();
        let reveal = |g: &games::Model, owned| decide_unlock(g, owned, &ps, None);

        assert!(matches!(
            reveal(&game(1, GameType::Free, 0.0), false),
            UnlockOutcome::Revealed { .. }
        ));
        assert!(matches!(
            reveal(&game(1, GameType::CustomVip, 50.0), false),
            UnlockOutcome::SlotFull { .. }
        ));
        assert!(matches!(
            reveal(&game(1, GameType::CustomCorrectScore, 50.0), false),
            UnlockOutcome::SlotFull { .. }
        ));
        assert!(matches!(
            reveal(&game(1, GameType::Recovery, 0.0), false),
            UnlockOutcome::RecoveryOnly { .. }
        ));
        // owning a custom game still reveals it
        assert!(matches!(
            reveal(&game(1, GameType::CustomVip, 50.0), true),
            UnlockOutcome::Revealed { .. }
        ));

        match reveal(&game(3, GameType::Vip, 20.0), false) {
            UnlockOutcome::PaymentRequired {
                game_id,
                amount_minor,
                currency,
                public_key,
                ..
            } => {
                assert_eq!(game_id, 3);
                assert_eq!(amount_minor, 2000);
                assert_eq!(currency, "GHS");
                assert_eq!(public_key, "pk_test");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_record_purchase_inserts_once() {
        let user = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<purchases::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            .append_query_results([vec![purchase(user, 1)]])
            .into_connection();
        let svc = PurchaseService::new(Arc::new(db), paystack());

        let first = svc.record_purchase(new_purchase(user)).await.unwrap();
        assert!(!first.already_recorded);

        let second = svc.record_purchase(new_purchase(user)).await.unwrap();
        assert!(second.already_recorded);
        assert_eq!(second.message, "Purchase already recorded");
    }

    #[tokio::test]
    async fn test_conflicting_insert_counts_as_already_recorded() {
        let user = Uuid::new_v4();
        // a concurrent request won the race between our check and insert
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<purchases::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let svc = PurchaseService::new(Arc::new(db), paystack());
        let outcome = svc.record_purchase(new_purchase(user)).await.unwrap();
        assert!(outcome.already_recorded);
    }

    #[tokio::test]
    async fn test_storage_failure_after_payment_needs_support() {
        let user = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<purchases::Model>::new()])
            .append_exec_errors([DbErr::Custom("disk full".into())])
            .into_connection();
        let svc = PurchaseService::new(Arc::new(db), paystack());
        match svc.record_verified(new_purchase(user)).await {
            Err(AppError::EntitlementNotRecorded { reference, reason }) => {
                assert_eq!(reference, "T1");
                assert!(reason.contains("disk full"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_rejects_missing_fields_and_foreign_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let svc = PurchaseService::new(Arc::new(db), paystack());
        let caller = AuthUser {
            id: Uuid::new_v4(),
            email: None,
        };

        let missing = VerifyPaymentRequest {
            reference: Some("T1".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.verify_and_record(&caller, false, missing).await,
            Err(AppError::ValidationError(_))
        ));

        let foreign = VerifyPaymentRequest {
            reference: Some("T1".into()),
            user_id: Some(Uuid::new_v4()),
            game_id: Some(1),
        };
        assert!(matches!(
            svc.verify_and_record(&caller, false, foreign).await,
            Err(AppError::Forbidden)
        ));
    }

    fn charge(reference: &str, amount: i64) -> TransactionData {
        TransactionData {
            status: "success".to_string(),
            reference: reference.to_string(),
            amount,
            currency: Some("GHS".to_string()),
            paid_at: None,
        }
    }

    #[test]
    fn test_charge_must_cover_price() {
        let vip = game(2, GameType::Vip, 500.0);
        assert!(matches!(
            check_charge_covers(&charge("CHEAP1", 100), &vip),
            Err(AppError::ValidationError(_))
        ));
        assert!(check_charge_covers(&charge("FULL1", 50_000), &vip).is_ok());
        assert!(check_charge_covers(&charge("OVER1", 60_000), &vip).is_ok());
    }

    #[tokio::test]
    async fn test_reference_cannot_unlock_a_second_game() {
        let user = Uuid::new_v4();
        // T1 already paid for game 1; the gateway must not be asked again
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![game(2, GameType::Vip, 500.0)]])
            .append_query_results([vec![purchase(user, 1)]])
            .into_connection();
        let svc = PurchaseService::new(Arc::new(db), paystack());
        let caller = AuthUser {
            id: user,
            email: None,
        };

        let replay = VerifyPaymentRequest {
            reference: Some(" T1 ".into()),
            user_id: Some(user),
            game_id: Some(2),
        };
        match svc.verify_and_record(&caller, false, replay).await {
            Err(AppError::ValidationError(msg)) => {
                assert_eq!(msg, "Payment reference has already been used.")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reference_reuse_for_same_purchase_is_allowed() {
        let user = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![purchase(user, 1)]])
            .append_query_results([vec![purchase(Uuid::new_v4(), 1)]])
            .into_connection();
        let svc = PurchaseService::new(Arc::new(db), paystack());

        assert!(svc.ensure_reference_unused("T1", user, 1).await.is_ok());
        assert!(matches!(
            svc.ensure_reference_unused("T1", user, 1).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_grant_requires_ids() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let svc = PurchaseService::new(Arc::new(db), paystack());
        let req = RecordPurchaseRequest {
            game_id: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            svc.grant(req).await,
            Err(AppError::ValidationError(_))
        ));
    }
}
