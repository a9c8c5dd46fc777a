//! Periodic purge of expired rooms and guest sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::repos::{PurgeReport, RetentionPolicy, RoomStore};

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

pub async fn sweep_once(
    store: &dyn RoomStore,
    clock: &dyn Clock,
    policy: &RetentionPolicy,
) -> Option<PurgeReport> {
    match store.purge_expired(clock.now(), policy).await {
        Ok(report) => {
            if report != PurgeReport::default() {
                info!(rooms = report.rooms, sessions = report.sessions, "Retention sweep");
            }
            Some(report)
        }
        Err(e) => {
            warn!(error = %e, "Retention sweep failed");
            None
        }
    }
}

pub fn spawn_retention(
    store: Arc<dyn RoomStore>,
    clock: Arc<dyn Clock>,
    policy: RetentionPolicy,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_once(store.as_ref(), clock.as_ref(), &policy).await;
        }
    })
}
