//! Fault policy definition for gateway-level chaos injection.
//!
//! A single policy is active process-wide at any time. It is replaced
//! wholesale by administrative writes and never merged field by field.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Percentage;

/// Process-wide fault injection policy
///
/// A policy with `enabled == false` injects nothing, exactly like
/// [`FaultPolicy::default()`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultPolicy {
    /// Whether fault injection is enabled
    pub enabled: bool,

    /// Exact request path the policy applies to (`None` = all routes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    /// Delay applied before the request continues
    #[serde(default, rename = "delay_ms", with = "duration_millis")]
    pub delay: Duration,

    /// Chance of a synthetic service-unavailable failure
    #[serde(default)]
    pub error_rate: Percentage,

    /// Chance of dropping the request without a response
    #[serde(default)]
    pub drop_rate: Percentage,

    /// Absolute time after which the policy no longer applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl FaultPolicy {
    /// Create an enabled policy targeting all routes with no faults configured
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Restrict the policy to a single path; an empty path means all routes
    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        let route = route.into();
        self.route = if route.is_empty() { None } else { Some(route) };
        self
    }

    /// Set the injected delay
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the synthetic failure rate
    #[must_use]
    pub const fn with_error_rate(mut self, rate: Percentage) -> Self {
        self.error_rate = rate;
        self
    }

    /// Set the drop rate
    #[must_use]
    pub const fn with_drop_rate(mut self, rate: Percentage) -> Self {
        self.drop_rate = rate;
        self
    }

    /// Set an absolute expiry
    #[must_use]
    pub const fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Expire the policy `ttl` after `now`; a zero `ttl` leaves it unbounded
    #[must_use]
    pub fn expiring_after(self, now: DateTime<Utc>, ttl: Duration) -> Self {
        if ttl.is_zero() {
            return self;
        }
        // An expiry past the representable range leaves the policy unbounded
        match chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
        {
            Some(at) => self.with_expiry(at),
            None => self,
        }
    }

    /// Whether `now` is past the policy's expiry
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }

    /// Whether the policy should inject anything at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.enabled && !self.is_expired_at(now)
    }

    /// Whether the policy's route scope covers `path`
    pub fn applies_to(&self, path: &str) -> bool {
        self.route.as_deref().is_none_or(|route| route == path)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
