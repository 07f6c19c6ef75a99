//! Game lifecycle rules: odds aggregation, status derivation and retention.
//!
//! Everything here is pure so the same rules can run from a request handler,
//! the admin "reconcile now" endpoint and the background task.

use crate::entities::{GameStatus, Match, MatchStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_RETENTION_DAYS: i64 = 3;

/// Product of all parseable odds, "N/A" counting as 1, rounded to 2 dp.
pub fn aggregate_odds(matches: &[Match]) -> f64 {
    let product = matches
        .iter()
        .map(|m| m.parsed_odds().unwrap_or(1.0))
        .product::<f64>();
    round2(product)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// An empty slip never counts as resolved.
pub fn all_resolved(matches: &[Match]) -> bool {
    !matches.is_empty() && matches.iter().all(|m| m.status.is_resolved())
}

pub fn has_pending(matches: &[Match]) -> bool {
    matches.iter().any(|m| m.status == MatchStatus::Pending)
}

pub fn has_loss(matches: &[Match]) -> bool {
    matches.iter().any(|m| m.status == MatchStatus::Lost)
}

/// The status a game should move to, or `None` when it is already where it belongs.
///
/// Archived games are left alone; bringing one back is an explicit admin restore.
pub fn next_status(current: GameStatus, matches: &[Match]) -> Option<GameStatus> {
    match current {
        GameStatus::Archived => None,
        _ if all_resolved(matches) => Some(GameStatus::Archived),
        GameStatus::Pending if has_pending(matches) => Some(GameStatus::Active),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusCounts {
    pub won: usize,
    pub lost: usize,
    pub pending: usize,
}

pub fn status_counts(matches: &[Match]) -> StatusCounts {
    matches
        .iter()
        .fold(StatusCounts::default(), |mut acc, m| {
            match m.status {
                MatchStatus::Won => acc.won += 1,
                MatchStatus::Lost => acc.lost += 1,
                MatchStatus::Pending => acc.pending += 1,
            }
            acc
        })
}

pub fn retention_cutoff(now: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    now - Duration::days(retention_days)
}

/// Strictly older than the window. A game archived exactly `retention_days`
/// ago survives until the next scan.
pub fn is_deletion_eligible(
    archived_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    retention_days: i64,
) -> bool {
    archived_at.is_some_and(|at| at < retention_cutoff(now, retention_days))
}

/// Whole days since archival, for the archived-games screen.
pub fn days_since(archived_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - archived_at).num_days().max(0)
}
