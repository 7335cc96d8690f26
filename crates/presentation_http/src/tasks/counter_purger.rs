//! In-memory counter purger
//!
//! Periodically drops expired quota counters so keys of tenants that stop
//! sending traffic are reclaimed.

use std::sync::Arc;
use std::time::Duration;

use infrastructure::InMemoryCounterStore;
use tracing::{debug, info};

/// Spawn a background task that purges expired counters.
///
/// Returns a `JoinHandle` that can be used to abort the task when shutting down.
pub fn spawn_counter_purger(
    store: Arc<InMemoryCounterStore>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Starting counter purger");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Don't run immediately on startup
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let purged = store.purge_expired();
            debug!(purged, remaining = store.len(), "Counter purge complete");
        }
    })
}
