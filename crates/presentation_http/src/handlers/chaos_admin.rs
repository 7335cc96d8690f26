//! Fault injection admin handlers
//!
//! `enable` replaces the policy wholesale and `disable` clears it; both are
//! idempotent. Request bodies are decoded leniently: an unparseable body or
//! a field of the wrong type is read as its zero value instead of failing
//! the request.

use std::time::Duration;

use axum::{Json, body::Bytes, extract::State};
use chrono::{DateTime, Utc};
use domain::{FaultPolicy, Percentage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::state::AppState;

/// Body of `POST /admin/chaos/enable`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnableChaosRequest {
    /// Exact path to target; empty means all routes
    #[serde(default)]
    pub route: String,
    /// Injected delay in milliseconds
    #[serde(default)]
    pub delay_ms: i64,
    /// Synthetic failure percentage
    #[serde(default)]
    pub error_rate: i64,
    /// Drop percentage
    #[serde(default)]
    pub drop_rate: i64,
    /// Lifetime in seconds; zero or negative means no expiry
    #[serde(default)]
    pub duration_sec: i64,
}

impl EnableChaosRequest {
    /// Decode a body, treating anything unreadable as a zero value
    pub fn from_body(body: &[u8]) -> Self {
        let value = match serde_json::from_slice::<Value>(body) {
            Ok(value) => value,
            Err(e) => {
                if !body.is_empty() {
                    warn!(error = %e, "Malformed chaos request body, using defaults");
                }
                return Self::default();
            },
        };

        Self {
            route: value
                .get("route")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            delay_ms: int_field(&value, "delay_ms"),
            error_rate: int_field(&value, "error_rate"),
            drop_rate: int_field(&value, "drop_rate"),
            duration_sec: int_field(&value, "duration_sec"),
        }
    }

    /// Build the policy this request describes, relative to `now`
    pub fn to_policy(&self, now: DateTime<Utc>) -> FaultPolicy {
        let delay = Duration::from_millis(u64::try_from(self.delay_ms).unwrap_or(0));
        let ttl = Duration::from_secs(u64::try_from(self.duration_sec).unwrap_or(0));

        FaultPolicy::enabled()
            .with_route(self.route.clone())
            .with_delay(delay)
            .with_error_rate(Percentage::saturating(self.error_rate))
            .with_drop_rate(Percentage::saturating(self.drop_rate))
            .expiring_after(now, ttl)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn int_field(value: &Value, name: &str) -> i64 {
    match value.get(name) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        _ => 0,
    }
}

/// Response of every chaos admin endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaosStatusResponse {
    /// `enabled` or `disabled`
    pub status: String,
    /// Policy in effect after the call
    pub policy: FaultPolicy,
}

impl ChaosStatusResponse {
    fn from_policy(policy: FaultPolicy) -> Self {
        let status = if policy.is_active_at(Utc::now()) {
            "enabled"
        } else {
            "disabled"
        };
        Self {
            status: status.to_string(),
            policy,
        }
    }
}

/// `POST /admin/chaos/enable`
pub async fn enable_chaos(State(state): State<AppState>, body: Bytes) -> Json<ChaosStatusResponse> {
    let request = EnableChaosRequest::from_body(&body);
    let policy = request.to_policy(Utc::now());
    info!(route = %request.route, duration_sec = request.duration_sec, "Chaos enabled");

    state.fault_injector.set(policy.clone());
    Json(ChaosStatusResponse {
        status: "enabled".to_string(),
        policy,
    })
}

/// `POST /admin/chaos/disable`
pub async fn disable_chaos(State(state): State<AppState>) -> Json<ChaosStatusResponse> {
    state.fault_injector.clear();
    info!("Chaos disabled");
    Json(ChaosStatusResponse {
        status: "disabled".to_string(),
        policy: FaultPolicy::default(),
    })
}

/// `GET /admin/chaos`
pub async fn get_chaos(State(state): State<AppState>) -> Json<ChaosStatusResponse> {
    Json(ChaosStatusResponse::from_policy(
        state.fault_injector.current(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_body_decodes() {
        let request = EnableChaosRequest::from_body(
            br#"{"route":"/orders","delay_ms":250,"error_rate":30,"drop_rate":5,"duration_sec":10}"#,
        );
        assert_eq!(
            request,
            EnableChaosRequest {
                route: "/orders".to_string(),
                delay_ms: 250,
                error_rate: 30,
                drop_rate: 5,
                duration_sec: 10,
            }
        );
    }

    #[test]
    fn malformed_body_is_default() {
        assert_eq!(
            EnableChaosRequest::from_body(b"{not json"),
            EnableChaosRequest::default()
        );
        assert_eq!(EnableChaosRequest::from_body(b""), EnableChaosRequest::default());
    }

    #[test]
    fn wrong_typed_field_is_zero_others_kept() {
        let request =
            EnableChaosRequest::from_body(br#"{"route":"/x","error_rate":"lots","drop_rate":7}"#);
        assert_eq!(request.route, "/x");
        assert_eq!(request.error_rate, 0);
        assert_eq!(request.drop_rate, 7);
    }

    #[test]
    fn policy_clamps_values() {
        let policy = EnableChaosRequest {
            delay_ms: -5,
            error_rate: 250,
            drop_rate: -1,
            ..EnableChaosRequest::default()
        }
        .to_policy(Utc::now());

        assert!(policy.enabled);
        assert!(policy.delay.is_zero());
        assert_eq!(policy.error_rate, Percentage::FULL);
        assert!(policy.drop_rate.is_zero());
        assert!(policy.route.is_none());
        assert!(policy.expires_at.is_none());
    }

    #[test]
    fn positive_duration_sets_expiry() {
        let now = Utc::now();
        let policy = EnableChaosRequest {
            route: "/orders".to_string(),
            duration_sec: 5,
            ..EnableChaosRequest::default()
        }
        .to_policy(now);

        assert_eq!(policy.route.as_deref(), Some("/orders"));
        assert_eq!(policy.expires_at, Some(now + chrono::Duration::seconds(5)));
    }

    #[test]
    fn huge_duration_is_unbounded() {
        let request =
            EnableChaosRequest::from_body(br#"{"error_rate":100,"duration_sec":10000000000000}"#);
        let policy = request.to_policy(Utc::now());

        assert!(policy.enabled);
        assert_eq!(policy.error_rate, Percentage::FULL);
        assert!(policy.expires_at.is_none());
    }

    #[test]
    fn status_reflects_activity() {
        assert_eq!(
            ChaosStatusResponse::from_policy(FaultPolicy::enabled()).status,
            "enabled"
        );
        assert_eq!(
            ChaosStatusResponse::from_policy(FaultPolicy::default()).status,
            "disabled"
        );
    }
}
