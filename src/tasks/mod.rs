//! Background scheduled tasks.
//!
//! Call `spawn_all` once during startup; tasks are detached with `tokio::spawn`.

use crate::services::LifecycleService;
use std::time::Duration;

/// Spawn all background tasks.
pub fn spawn_all(lifecycle_service: LifecycleService, reconcile_interval_secs: u64) {
    // Game lifecycle: activate, archive, purge past retention
    {
        let svc = lifecycle_service.clone();
        let interval = Duration::from_secs(reconcile_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                log::debug!("Running scheduled game reconcile");
                svc.reconcile().await;
                tokio::time::sleep(interval).await;
            }
        });
    }
}
