//! Fault policy expiry sweeper
//!
//! Periodically clears a fault policy whose expiry has passed, so an expired
//! policy is removed even while no traffic arrives.

use std::sync::Arc;
use std::time::Duration;

use application::FaultInjector;
use chrono::Utc;
use tracing::{debug, info};

/// Spawn a background task that expires the fault policy.
///
/// Returns a `JoinHandle` that can be used to abort the task when shutting down.
///
/// # Example
///
/// ```ignore
/// let sweeper = spawn_fault_sweeper(injector.clone(), Duration::from_secs(1));
///
/// // On shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_fault_sweeper(
    injector: Arc<FaultInjector>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    info!(
        interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        "Starting fault policy sweeper"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Don't run immediately on startup
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if injector.sweep_expired(Utc::now()) {
                info!("Expired fault policy cleared by sweeper");
            } else {
                debug!("No expired fault policy");
            }
        }
    })
}
