//! Prometheus recorder for labelled gateway metrics

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
pub use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;
use tracing::info;

/// Mediated requests, labelled by route, tenant, status and outcome
pub const REQUESTS_TOTAL: &str = "gateway_requests_total";
/// Mediated requests that did not reach a backend successfully
pub const REQUEST_ERRORS_TOTAL: &str = "gateway_request_errors_total";
/// Requests denied by tenant quota
pub const RATE_LIMITED_TOTAL: &str = "gateway_rate_limited_total";
/// Requests dropped by the fault policy
pub const CHAOS_DROPPED_TOTAL: &str = "gateway_chaos_dropped_total";
/// Synthetic failures injected by the fault policy
pub const CHAOS_FAILED_TOTAL: &str = "gateway_chaos_failed_total";
/// End-to-end mediation latency
pub const REQUEST_DURATION_SECONDS: &str = "gateway_request_duration_seconds";
/// Keys held by the in-memory counter store
pub const COUNTER_KEYS: &str = "gateway_counter_keys";

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Metrics recorder failure
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Building or installing the recorder failed
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),
}

/// Install the global Prometheus recorder and describe every gateway metric
///
/// Fails if a recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            LATENCY_BUCKETS,
        )
        .map_err(|e| MetricsError::Install(e.to_string()))?
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_metrics();
    info!("Metrics recorder installed");
    Ok(handle)
}

/// Register help text and units with the current recorder
pub fn describe_metrics() {
    describe_counter!(
        REQUESTS_TOTAL,
        Unit::Count,
        "Mediated requests by route, tenant, status and outcome"
    );
    describe_counter!(
        REQUEST_ERRORS_TOTAL,
        Unit::Count,
        "Mediated requests answered with an error or dropped"
    );
    describe_counter!(RATE_LIMITED_TOTAL, Unit::Count, "Requests denied by tenant quota");
    describe_counter!(CHAOS_DROPPED_TOTAL, Unit::Count, "Requests dropped by fault injection");
    describe_counter!(CHAOS_FAILED_TOTAL, Unit::Count, "Failures injected by fault injection");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Mediation latency from pipeline entry to response"
    );
    describe_gauge!(COUNTER_KEYS, Unit::Count, "Keys held by the in-memory counter store");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn described_counters_render() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_metrics();
            metrics::counter!(RATE_LIMITED_TOTAL, "tenant" => "t1").increment(2);
        });

        let rendered = handle.render();
        assert!(rendered.contains("# HELP gateway_rate_limited_total"));
        assert!(rendered.contains("gateway_rate_limited_total{tenant=\"t1\"} 2"));
    }
}
