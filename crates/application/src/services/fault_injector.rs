//! Fault injector - Process-wide chaos policy applied to live traffic
//!
//! Holds the single [`FaultPolicy`] behind a read-write lock. Requests take
//! a snapshot under the read lock and release it before any delay, so an
//! administrative write never waits on a slow request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::{DecisionKind, FaultPolicy};
use parking_lot::RwLock;
use rand::Rng;
use tracing::{debug, info};

use crate::ports::DecisionSinkPort;
use crate::request_context::RequestContext;

/// Status code of the synthetic failure
pub const INJECTED_ERROR_STATUS: u16 = 503;

/// Source of uniform rolls in `0..100`
pub trait RandomSource: Send + Sync + std::fmt::Debug {
    /// Draw one roll
    fn roll_percent(&self) -> u8;
}

/// Thread-local RNG from `rand`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn roll_percent(&self) -> u8 {
        rand::rng().random_range(0..100)
    }
}

/// Result of evaluating the policy against one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOutcome {
    /// Continue to the next stage
    Pass,
    /// Answer with a synthetic failure
    Fail {
        /// HTTP status to report
        status: u16,
    },
    /// Write no response at all
    Drop,
}

/// Owner of the process-wide fault policy
#[derive(Debug)]
pub struct FaultInjector {
    policy: RwLock<FaultPolicy>,
    sink: Arc<dyn DecisionSinkPort>,
    random: Arc<dyn RandomSource>,
}

impl FaultInjector {
    /// Create an injector with an inactive policy
    pub fn new(sink: Arc<dyn DecisionSinkPort>) -> Self {
        Self::with_random_source(sink, Arc::new(ThreadRandom))
    }

    /// Create an injector drawing rolls from `random`
    pub fn with_random_source(
        sink: Arc<dyn DecisionSinkPort>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            policy: RwLock::new(FaultPolicy::default()),
            sink,
            random,
        }
    }

    /// Snapshot of the current policy
    pub fn current(&self) -> FaultPolicy {
        self.policy.read().clone()
    }

    /// Replace the policy wholesale
    pub fn set(&self, policy: FaultPolicy) {
        info!(
            enabled = policy.enabled,
            route = policy.route.as_deref().unwrap_or("*"),
            delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
            error_rate = policy.error_rate.value(),
            drop_rate = policy.drop_rate.value(),
            expires_at = ?policy.expires_at,
            "Fault policy set"
        );
        *self.policy.write() = policy;
    }

    /// Reset to the inactive policy
    pub fn clear(&self) {
        *self.policy.write() = FaultPolicy::default();
        info!("Fault policy cleared");
    }

    /// Clear the policy if it has expired at `now`; returns whether it did
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> bool {
        if !self.policy.read().is_expired_at(now) {
            return false;
        }
        let mut policy = self.policy.write();
        // Re-check: an admin write may have landed between the two locks
        if !policy.is_expired_at(now) {
            return false;
        }
        *policy = FaultPolicy::default();
        drop(policy);
        info!("Fault policy expired");
        true
    }

    /// Evaluate the policy for one request
    ///
    /// Emits at least one chaos event. A configured delay suspends only the
    /// calling task and is cancelled with it.
    pub async fn evaluate(&self, ctx: &RequestContext) -> FaultOutcome {
        let policy = self.current();

        if !policy.is_active_at(Utc::now()) {
            self.sink.emit(ctx.event(DecisionKind::Chaos, "disabled"));
            return FaultOutcome::Pass;
        }

        if !policy.applies_to(ctx.path()) {
            self.sink.emit(
                ctx.event(DecisionKind::Chaos, "not active for this route")
                    .with_extra("chaos_route", policy.route.clone().unwrap_or_default()),
            );
            return FaultOutcome::Pass;
        }

        if !policy.delay.is_zero() {
            let delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX);
            debug!(delay_ms, path = %ctx.path(), "Injecting delay");
            self.sink.emit(
                ctx.event(DecisionKind::Chaos, "injecting delay")
                    .with_extra("delay_ms", delay_ms),
            );
            tokio::time::sleep(policy.delay).await;
        }

        if !policy.error_rate.is_zero() && policy.error_rate.admits_roll(self.random.roll_percent())
        {
            self.sink.emit(
                ctx.event(DecisionKind::Chaos, "injecting error")
                    .with_extra("error_code", INJECTED_ERROR_STATUS),
            );
            return FaultOutcome::Fail {
                status: INJECTED_ERROR_STATUS,
            };
        }

        if !policy.drop_rate.is_zero() && policy.drop_rate.admits_roll(self.random.roll_percent()) {
            self.sink.emit(ctx.event(DecisionKind::Chaos, "dropping request"));
            return FaultOutcome::Drop;
        }

        if policy.delay.is_zero() {
            self.sink.emit(ctx.event(DecisionKind::Chaos, "no fault injected"));
        }
        FaultOutcome::Pass
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use domain::Percentage;

    use super::*;
    use crate::testing::{RecordingSink, SequenceRandom};

    fn injector(rolls: impl IntoIterator<Item = u8>) -> (FaultInjector, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let injector =
            FaultInjector::with_random_source(sink.clone(), Arc::new(SequenceRandom::new(rolls)));
        (injector, sink)
    }

    fn ctx(path: &str) -> RequestContext {
        RequestContext::new("GET", path)
    }

    #[test]
    fn thread_random_stays_in_range() {
        let random = ThreadRandom;
        for _ in 0..1000 {
            assert!(random.roll_percent() < 100);
        }
    }

    #[test]
    fn starts_inactive() {
        let (injector, _) = injector([]);
        assert_eq!(injector.current(), FaultPolicy::default());
    }

    #[test]
    fn set_replaces_wholesale() {
        let (injector, _) = injector([]);
        injector.set(
            FaultPolicy::enabled()
                .with_route("/orders")
                .with_error_rate(Percentage::FULL),
        );
        injector.set(FaultPolicy::enabled().with_drop_rate(Percentage::saturating(10)));

        let current = injector.current();
        assert!(current.route.is_none());
        assert!(current.error_rate.is_zero());
        assert_eq!(current.drop_rate.value(), 10);
    }

    #[test]
    fn clear_is_idempotent() {
        let (injector, _) = injector([]);
        injector.set(FaultPolicy::enabled());
        injector.clear();
        injector.clear();
        assert_eq!(injector.current(), FaultPolicy::default());
    }

    #[test]
    fn sweep_clears_only_expired_policies() {
        let (injector, _) = injector([]);
        let now = Utc::now();

        injector.set(FaultPolicy::enabled().with_expiry(now + chrono::Duration::seconds(10)));
        assert!(!injector.sweep_expired(now));
        assert!(injector.current().enabled);

        assert!(injector.sweep_expired(now + chrono::Duration::seconds(11)));
        assert_eq!(injector.current(), FaultPolicy::default());
    }

    #[test]
    fn sweep_leaves_unbounded_policy() {
        let (injector, _) = injector([]);
        injector.set(FaultPolicy::enabled());
        assert!(!injector.sweep_expired(Utc::now() + chrono::Duration::days(365)));
        assert!(injector.current().enabled);
    }

    #[tokio::test]
    async fn inactive_policy_passes() {
        let (injector, sink) = injector([0, 0]);

        assert_eq!(injector.evaluate(&ctx("/orders")).await, FaultOutcome::Pass);
        assert_eq!(sink.reasons(), vec![(DecisionKind::Chaos, "disabled".to_string())]);
    }

    #[tokio::test]
    async fn disabled_policy_with_rates_passes() {
        let (injector, sink) = injector([0, 0]);
        injector.set(FaultPolicy {
            enabled: false,
            error_rate: Percentage::FULL,
            drop_rate: Percentage::FULL,
            ..FaultPolicy::default()
        });

        assert_eq!(injector.evaluate(&ctx("/orders")).await, FaultOutcome::Pass);
        assert_eq!(sink.last().unwrap().reason, "disabled");
    }

    #[tokio::test]
    async fn expired_policy_is_treated_as_inactive() {
        let (injector, sink) = injector([0]);
        injector.set(
            FaultPolicy::enabled()
                .with_error_rate(Percentage::FULL)
                .with_expiry(Utc::now() - chrono::Duration::seconds(1)),
        );

        assert_eq!(injector.evaluate(&ctx("/orders")).await, FaultOutcome::Pass);
        assert_eq!(sink.last().unwrap().reason, "disabled");
    }

    #[tokio::test]
    async fn other_route_is_unaffected() {
        let (injector, sink) = injector([0, 0]);
        injector.set(
            FaultPolicy::enabled()
                .with_route("/x")
                .with_error_rate(Percentage::FULL),
        );

        assert_eq!(injector.evaluate(&ctx("/y")).await, FaultOutcome::Pass);
        let event = sink.last().unwrap();
        assert_eq!(event.reason, "not active for this route");
        assert_eq!(event.extra_field("chaos_route"), Some(&serde_json::json!("/x")));
    }

    #[tokio::test]
    async fn error_roll_below_rate_fails() {
        let (injector, sink) = injector([29]);
        injector.set(FaultPolicy::enabled().with_error_rate(Percentage::saturating(30)));

        assert_eq!(
            injector.evaluate(&ctx("/orders")).await,
            FaultOutcome::Fail { status: 503 }
        );
        let event = sink.last().unwrap();
        assert_eq!(event.reason, "injecting error");
        assert_eq!(event.extra_field("error_code"), Some(&serde_json::json!(503)));
    }

    #[tokio::test]
    async fn error_roll_at_rate_passes_to_drop_roll() {
        let (injector, sink) = injector([30, 9]);
        injector.set(
            FaultPolicy::enabled()
                .with_error_rate(Percentage::saturating(30))
                .with_drop_rate(Percentage::saturating(10)),
        );

        assert_eq!(injector.evaluate(&ctx("/orders")).await, FaultOutcome::Drop);
        assert_eq!(sink.last().unwrap().reason, "dropping request");
    }

    #[tokio::test]
    async fn zero_rates_never_roll() {
        // Sequence yields 0 first; a zero rate must not consume or fire on it
        let (injector, sink) = injector([0, 0]);
        injector.set(FaultPolicy::enabled());

        assert_eq!(injector.evaluate(&ctx("/orders")).await, FaultOutcome::Pass);
        assert_eq!(sink.last().unwrap().reason, "no fault injected");
    }

    #[tokio::test]
    async fn full_error_rate_always_fails() {
        let (injector, _) = injector([99, 99, 99]);
        injector.set(FaultPolicy::enabled().with_error_rate(Percentage::FULL));

        for _ in 0..3 {
            assert_eq!(
                injector.evaluate(&ctx("/orders")).await,
                FaultOutcome::Fail { status: 503 }
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn delay_suspends_then_continues() {
        let (injector, sink) = injector([]);
        injector.set(FaultPolicy::enabled().with_delay(Duration::from_millis(250)));

        let started = tokio::time::Instant::now();
        assert_eq!(injector.evaluate(&ctx("/orders")).await, FaultOutcome::Pass);
        assert!(started.elapsed() >= Duration::from_millis(250));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason, "injecting delay");
        assert_eq!(events[0].extra_field("delay_ms"), Some(&serde_json::json!(250)));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_then_error() {
        let (injector, sink) = injector([0]);
        injector.set(
            FaultPolicy::enabled()
                .with_delay(Duration::from_millis(100))
                .with_error_rate(Percentage::FULL),
        );

        assert_eq!(
            injector.evaluate(&ctx("/orders")).await,
            FaultOutcome::Fail { status: 503 }
        );
        assert_eq!(
            sink.reasons(),
            vec![
                (DecisionKind::Chaos, "injecting delay".to_string()),
                (DecisionKind::Chaos, "injecting error".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_cancelled_with_request() {
        let (injector, _) = injector([]);
        injector.set(FaultPolicy::enabled().with_delay(Duration::from_secs(3600)));

        let result =
            tokio::time::timeout(Duration::from_millis(10), injector.evaluate(&ctx("/x"))).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn admin_write_not_blocked_by_delayed_request() {
        let sink = Arc::new(RecordingSink::default());
        let injector = Arc::new(FaultInjector::with_random_source(
            sink,
            Arc::new(SequenceRandom::new([])),
        ));
        injector.set(FaultPolicy::enabled().with_delay(Duration::from_secs(60)));

        let slow = tokio::spawn({
            let injector = injector.clone();
            async move { injector.evaluate(&ctx("/orders")).await }
        });
        tokio::task::yield_now().await;

        injector.clear();
        assert_eq!(injector.current(), FaultPolicy::default());

        slow.abort();
    }
}
