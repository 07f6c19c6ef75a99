//! Reconciliation of stored games against the lifecycle rules.
//!
//! `reconcile` is idempotent and may run concurrently with itself: every write
//! moves a row to a state that a second run would compute as well.

use crate::database::DbPool;
use crate::entities::{GameStatus, game_entity as games};
use crate::utils::lifecycle::{next_status, retention_cutoff};
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReconcileReport {
    pub archived: Vec<i64>,
    pub activated: Vec<i64>,
    pub deleted: u64,
    /// Steps that failed; the next run picks the same rows up again.
    pub notices: Vec<String>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.archived.is_empty()
            && self.activated.is_empty()
            && self.deleted == 0
            && self.notices.is_empty()
    }
}

/// Splits live games into the ids that should be archived and activated.
pub fn plan_transitions(games: &[games::Model]) -> (Vec<i64>, Vec<i64>) {
    let mut archive = Vec::new();
    let mut activate = Vec::new();
    for game in games {
        match next_status(game.status, game.match_data.as_slice()) {
            Some(GameStatus::Archived) => archive.push(game.id),
            Some(GameStatus::Active) => activate.push(game.id),
            _ => {}
        }
    }
    (archive, activate)
}

#[derive(Clone)]
pub struct LifecycleService {
    pool: DbPool,
    retention_days: i64,
}

impl LifecycleService {
    pub fn new(pool: DbPool, retention_days: i64) -> Self {
        Self {
            pool,
            retention_days,
        }
    }

    pub async fn reconcile(&self) -> ReconcileReport {
        self.reconcile_at(Utc::now()).await
    }

    pub async fn reconcile_at(&self, now: DateTime<Utc>) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        match games::Entity::find()
            .filter(games::Column::Status.ne(GameStatus::Archived))
            .all(self.pool.as_ref())
            .await
        {
            Ok(live) => {
                let (archive, activate) = plan_transitions(&live);
                if !archive.is_empty() {
                    match self.archive(&archive, now).await {
                        Ok(_) => report.archived = archive,
                        Err(e) => {
                            log::error!("Failed to archive games {archive:?}: {e}");
                            report.notices.push(format!("archive failed: {e}"));
                        }
                    }
                }
                if !activate.is_empty() {
                    match self.activate(&activate, now).await {
                        Ok(_) => report.activated = activate,
                        Err(e) => {
                            log::error!("Failed to activate games {activate:?}: {e}");
                            report.notices.push(format!("activate failed: {e}"));
                        }
                    }
                }
            }
            Err(e) => {
                log::error!("Failed to load games for reconciliation: {e}");
                report.notices.push(format!("load failed: {e}"));
            }
        }

        match self.purge_expired(now).await {
            Ok(n) => report.deleted = n,
            Err(e) => {
                log::error!("Failed to delete expired archived games: {e}");
                report.notices.push(format!("cleanup failed: {e}"));
            }
        }

        if !report.is_noop() {
            log::info!(
                "Reconciled games: archived={:?} activated={:?} deleted={}",
                report.archived,
                report.activated,
                report.deleted
            );
        }
        report
    }

    /// Runs a reconciliation without holding up the caller.
    pub fn reconcile_in_background(&self) {
        let svc = self.clone();
        tokio::spawn(async move {
            svc.reconcile().await;
        });
    }

    async fn archive(&self, ids: &[i64], now: DateTime<Utc>) -> Result<u64, sea_orm::DbErr> {
        let res = games::Entity::update_many()
            .set(games::ActiveModel {
                status: Set(GameStatus::Archived),
                archived_at: Set(Some(now)),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(games::Column::Id.is_in(ids.iter().copied()))
            .filter(games::Column::Status.ne(GameStatus::Archived))
            .exec(self.pool.as_ref())
            .await?;
        Ok(res.rows_affected)
    }

    async fn activate(&self, ids: &[i64], now: DateTime<Utc>) -> Result<u64, sea_orm::DbErr> {
        let res = games::Entity::update_many()
            .set(games::ActiveModel {
                status: Set(GameStatus::Active),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(games::Column::Id.is_in(ids.iter().copied()))
            .filter(games::Column::Status.eq(GameStatus::Pending))
            .exec(self.pool.as_ref())
            .await?;
        Ok(res.rows_affected)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, sea_orm::DbErr> {
        let cutoff = retention_cutoff(now, self.retention_days);
        let res = games::Entity::delete_many()
            .filter(games::Column::Status.eq(GameStatus::Archived))
            .filter(games::Column::ArchivedAt.lt(cutoff))
            .exec(self.pool.as_ref())
            .await?;
        Ok(res.rows_affected)
    }
}
