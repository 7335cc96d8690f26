//! Admission controller - Per-tenant fixed-window quota enforcement
//!
//! Each tenant owns one counter in the shared store, keyed
//! `{key_prefix}:{tenant}`. The counter is created at `limit - 1` on the
//! first request of a window and expires with the window; once it reaches
//! zero every further request is denied until it expires. There is no
//! partial refill.

use std::sync::Arc;
use std::time::Duration;

use domain::{DecisionKind, TenantId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ports::{CounterStorePort, DecisionSinkPort, QuotaReading};
use crate::request_context::RequestContext;

/// Default requests admitted per tenant per window
const DEFAULT_LIMIT: u32 = 5;

/// Default window length in seconds
const DEFAULT_WINDOW_SECS: u64 = 60;

/// Behaviour when the counter store cannot be reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFailureMode {
    /// Deny the request
    #[default]
    Closed,
    /// Admit the request without consuming quota
    Open,
}

/// Configuration for the admission controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionConfig {
    /// Requests admitted per tenant per window (at least 1)
    pub limit: u32,
    /// Window length; also the TTL of the tenant's counter
    pub window: Duration,
    /// Namespace prepended to the tenant id to form the counter key
    pub key_prefix: String,
    /// What to do when the counter store errors
    pub on_store_error: StoreFailureMode,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
            key_prefix: "ratelimit".to_string(),
            on_store_error: StoreFailureMode::default(),
        }
    }
}

/// How an admission decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// First request of a new window
    FirstInWindow,
    /// Token consumed from an existing window
    Admitted,
    /// Window quota used up
    Exhausted,
    /// Counter store failed; `allowed` reflects the failure mode
    StoreUnavailable,
}

/// Result of [`AdmissionController::admit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Requests counted against the window so far
    pub used: u32,
    /// Configured window limit
    pub limit: u32,
    /// Tokens left in the window
    pub remaining: u32,
    /// Path that produced the decision
    pub outcome: AdmissionOutcome,
}

/// Fixed-window limiter backed by the shared counter store
#[derive(Debug)]
pub struct AdmissionController {
    store: Arc<dyn CounterStorePort>,
    sink: Arc<dyn DecisionSinkPort>,
    config: AdmissionConfig,
}

impl AdmissionController {
    /// Create a new controller; a zero limit is raised to 1
    pub fn new(
        store: Arc<dyn CounterStorePort>,
        sink: Arc<dyn DecisionSinkPort>,
        mut config: AdmissionConfig,
    ) -> Self {
        config.limit = config.limit.max(1);
        Self {
            store,
            sink,
            config,
        }
    }

    /// Active configuration
    pub const fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Counter key for a tenant
    pub fn key_for(&self, tenant: &TenantId) -> String {
        format!("{}:{}", self.config.key_prefix, tenant)
    }

    /// Decide whether `tenant` may make one more request in the current window
    ///
    /// Emits exactly one decision event.
    pub async fn admit(&self, ctx: &RequestContext, tenant: &TenantId) -> AdmissionDecision {
        let key = self.key_for(tenant);
        let limit = self.config.limit;

        let reading = self
            .store
            .acquire(&key, i64::from(limit), self.config.window)
            .await;

        let reading = match reading {
            Ok(reading) => reading,
            Err(e) => return self.store_unavailable(ctx, tenant, &e.to_string()),
        };

        let remaining = clamp_remaining(reading.remaining(), limit);
        let used = limit - remaining;
        let (outcome, reason) = match reading {
            QuotaReading::Initialized { .. } => {
                (AdmissionOutcome::FirstInWindow, "rate limit ok (first request)")
            },
            QuotaReading::Decremented { .. } => (AdmissionOutcome::Admitted, "rate limit ok"),
            QuotaReading::Exhausted { .. } => (AdmissionOutcome::Exhausted, "rate limit exceeded"),
        };
        let allowed = reading.is_allowed();
        let kind = if allowed {
            DecisionKind::Admit
        } else {
            DecisionKind::Block
        };

        debug!(tenant = %tenant, used, limit, allowed, "Admission evaluated");
        self.sink.emit(
            ctx.event(kind, reason)
                .with_tenant(tenant.as_str())
                .with_extra("limit", limit)
                .with_extra("used", used)
                .with_extra("remaining", remaining),
        );

        AdmissionDecision {
            allowed,
            used,
            limit,
            remaining,
            outcome,
        }
    }

    fn store_unavailable(
        &self,
        ctx: &RequestContext,
        tenant: &TenantId,
        error: &str,
    ) -> AdmissionDecision {
        warn!(tenant = %tenant, error = %error, mode = ?self.config.on_store_error, "Counter store unavailable");

        let (allowed, kind, reason) = match self.config.on_store_error {
            StoreFailureMode::Closed => (false, DecisionKind::Block, "counter store unavailable"),
            StoreFailureMode::Open => (
                true,
                DecisionKind::Admit,
                "counter store unavailable (fail open)",
            ),
        };
        self.sink.emit(
            ctx.event(kind, reason)
                .with_tenant(tenant.as_str())
                .with_extra("limit", self.config.limit)
                .with_extra("error", error),
        );

        AdmissionDecision {
            allowed,
            used: 0,
            limit: self.config.limit,
            remaining: 0,
            outcome: AdmissionOutcome::StoreUnavailable,
        }
    }
}

/// Map a raw counter value into `0..=limit`
fn clamp_remaining(raw: i64, limit: u32) -> u32 {
    u32::try_from(raw.clamp(0, i64::from(limit))).unwrap_or(0)
}
