//! Metrics and observability handlers
//!
//! `/metrics` reports in-process totals as JSON. `/metrics/prometheus`
//! renders the same totals in text exposition format, followed by the
//! labelled series of the installed Prometheus recorder, if any.

use std::{
    fmt::Write as _,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use application::{PipelineDecision, Rejection};
use axum::{Json, extract::State};
use infrastructure::telemetry::metrics::{
    CHAOS_DROPPED_TOTAL, CHAOS_FAILED_TOTAL, RATE_LIMITED_TOTAL, REQUEST_DURATION_SECONDS,
    REQUEST_ERRORS_TOTAL, REQUESTS_TOTAL,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Metrics response containing all application metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    /// Application metadata
    pub app: AppMetrics,
    /// Request statistics
    pub requests: RequestMetrics,
    /// Pipeline outcomes
    pub mediation: MediationMetrics,
}

/// Application metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetrics {
    /// Application version
    pub version: String,
    /// Application name
    pub name: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Request statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetrics {
    /// Total requests received
    pub total_requests: u64,
    /// Successful requests (2xx)
    pub success_count: u64,
    /// Client errors (4xx)
    pub client_error_count: u64,
    /// Server errors (5xx)
    pub server_error_count: u64,
    /// Average response time in milliseconds
    pub avg_response_time_ms: f64,
    /// Current active requests
    pub active_requests: u64,
}

/// Counts of pipeline outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediationMetrics {
    /// Handed to a backend
    pub forwarded: u64,
    /// Denied by tenant quota
    pub rate_limited: u64,
    /// Failed by fault injection
    pub chaos_failed: u64,
    /// Dropped by fault injection
    pub chaos_dropped: u64,
    /// No tenant resolved
    pub unauthorized: u64,
    /// No route matched
    pub route_not_found: u64,
    /// Counter store failed closed
    pub store_unavailable: u64,
}

/// How the pipeline disposed of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediationOutcome {
    /// Handed to the bound backend
    Forwarded,
    /// Quota exhausted
    RateLimited,
    /// Synthetic failure
    ChaosFailed,
    /// Dropped without a response
    ChaosDropped,
    /// No tenant
    Unauthorized,
    /// No binding matched
    RouteNotFound,
    /// Counter store failed
    StoreUnavailable,
}

impl MediationOutcome {
    /// Outcome of a pipeline decision
    pub const fn of<H>(decision: &PipelineDecision<'_, H>) -> Self {
        match decision {
            PipelineDecision::Forward(_) => Self::Forwarded,
            PipelineDecision::Drop => Self::ChaosDropped,
            PipelineDecision::Reject(rejection) => match rejection {
                Rejection::MissingTenant => Self::Unauthorized,
                Rejection::RateLimited { .. } => Self::RateLimited,
                Rejection::ServiceUnavailable => Self::ChaosFailed,
                Rejection::CounterStoreUnavailable => Self::StoreUnavailable,
                Rejection::RouteNotFound => Self::RouteNotFound,
            },
        }
    }

    /// Label value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forwarded => "forwarded",
            Self::RateLimited => "rate_limited",
            Self::ChaosFailed => "chaos_failed",
            Self::ChaosDropped => "chaos_dropped",
            Self::Unauthorized => "unauthorized",
            Self::RouteNotFound => "route_not_found",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

/// Atomic counters for request metrics
#[derive(Debug)]
pub struct MetricsCollector {
    /// Server start time
    start_time: Instant,
    /// Total requests
    total_requests: AtomicU64,
    /// Successful requests
    success_count: AtomicU64,
    /// Client errors
    client_error_count: AtomicU64,
    /// Server errors
    server_error_count: AtomicU64,
    /// Active requests
    active_requests: AtomicU64,
    /// Total response time in microseconds
    total_response_time_us: AtomicU64,
    forwarded: AtomicU64,
    rate_limited: AtomicU64,
    chaos_failed: AtomicU64,
    chaos_dropped: AtomicU64,
    unauthorized: AtomicU64,
    route_not_found: AtomicU64,
    store_unavailable: AtomicU64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_requests: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            client_error_count: AtomicU64::new(0),
            server_error_count: AtomicU64::new(0),
            active_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            forwarded: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
            chaos_failed: AtomicU64::new(0),
            chaos_dropped: AtomicU64::new(0),
            unauthorized: AtomicU64::new(0),
            route_not_found: AtomicU64::new(0),
            store_unavailable: AtomicU64::new(0),
        }
    }

    /// Record the start of a request
    pub fn request_start(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.active_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the end of a request
    pub fn request_end(&self, response_time_us: u64, status_code: u16) {
        self.active_requests.fetch_sub(1, Ordering::Relaxed);
        self.total_response_time_us.fetch_add(response_time_us, Ordering::Relaxed);

        match status_code {
            200..=299 => self.success_count.fetch_add(1, Ordering::Relaxed),
            400..=499 => self.client_error_count.fetch_add(1, Ordering::Relaxed),
            500..=599 => self.server_error_count.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };
    }

    /// Record how the pipeline disposed of one request
    ///
    /// Totals feed `/metrics`; labelled series go to the installed recorder.
    pub fn record_mediation(
        &self,
        route: &str,
        tenant: &str,
        outcome: MediationOutcome,
        status_code: u16,
        elapsed: Duration,
    ) {
        let total = match outcome {
            MediationOutcome::Forwarded => &self.forwarded,
            MediationOutcome::RateLimited => &self.rate_limited,
            MediationOutcome::ChaosFailed => &self.chaos_failed,
            MediationOutcome::ChaosDropped => &self.chaos_dropped,
            MediationOutcome::Unauthorized => &self.unauthorized,
            MediationOutcome::RouteNotFound => &self.route_not_found,
            MediationOutcome::StoreUnavailable => &self.store_unavailable,
        };
        total.fetch_add(1, Ordering::Relaxed);

        metrics::counter!(
            REQUESTS_TOTAL,
            "route" => route.to_string(),
            "tenant" => tenant.to_string(),
            "status" => status_code.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        metrics::histogram!(REQUEST_DURATION_SECONDS, "route" => route.to_string())
            .record(elapsed.as_secs_f64());

        if outcome != MediationOutcome::Forwarded || status_code >= 400 {
            metrics::counter!(
                REQUEST_ERRORS_TOTAL,
                "route" => route.to_string(),
                "reason" => outcome.as_str()
            )
            .increment(1);
        }
        match outcome {
            MediationOutcome::RateLimited => {
                metrics::counter!(RATE_LIMITED_TOTAL, "tenant" => tenant.to_string()).increment(1);
            },
            MediationOutcome::ChaosDropped => {
                metrics::counter!(CHAOS_DROPPED_TOTAL, "route" => route.to_string()).increment(1);
            },
            MediationOutcome::ChaosFailed => {
                metrics::counter!(CHAOS_FAILED_TOTAL, "route" => route.to_string()).increment(1);
            },
            _ => {},
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get request metrics snapshot
    pub fn request_metrics(&self) -> RequestMetrics {
        let total = self.total_requests.load(Ordering::Relaxed);
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);

        RequestMetrics {
            total_requests: total,
            success_count: self.success_count.load(Ordering::Relaxed),
            client_error_count: self.client_error_count.load(Ordering::Relaxed),
            server_error_count: self.server_error_count.load(Ordering::Relaxed),
            #[allow(clippy::cast_precision_loss)]
            avg_response_time_ms: if total > 0 {
                (total_time as f64) / (total as f64) / 1000.0
            } else {
                0.0
            },
            active_requests: self.active_requests.load(Ordering::Relaxed),
        }
    }

    /// Get pipeline outcome snapshot
    pub fn mediation_metrics(&self) -> MediationMetrics {
        MediationMetrics {
            forwarded: self.forwarded.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            chaos_failed: self.chaos_failed.load(Ordering::Relaxed),
            chaos_dropped: self.chaos_dropped.load(Ordering::Relaxed),
            unauthorized: self.unauthorized.load(Ordering::Relaxed),
            route_not_found: self.route_not_found.load(Ordering::Relaxed),
            store_unavailable: self.store_unavailable.load(Ordering::Relaxed),
        }
    }
}

/// `GET /metrics`
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let metrics = state.metrics.as_ref();

    Json(MetricsResponse {
        app: AppMetrics {
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: env!("CARGO_PKG_NAME").to_string(),
            uptime_seconds: metrics.uptime_seconds(),
        },
        requests: metrics.request_metrics(),
        mediation: metrics.mediation_metrics(),
    })
}

/// `GET /metrics/prometheus`
pub async fn get_metrics_prometheus(State(state): State<AppState>) -> String {
    let mut output = render_totals(&state.metrics);
    if let Some(handle) = &state.prometheus {
        output.push('\n');
        output.push_str(&handle.render());
    }
    output
}

fn push_metric(
    output: &mut String,
    name: &str,
    kind: &str,
    help: &str,
    value: impl std::fmt::Display,
) {
    let _ = write!(
        output,
        "# HELP {name} {help}\n# TYPE {name} {kind}\n{name} {value}\n\n"
    );
}

fn render_totals(metrics: &MetricsCollector) -> String {
    let requests = metrics.request_metrics();
    let mediation = metrics.mediation_metrics();
    let mut output = String::new();

    push_metric(
        &mut output,
        "app_uptime_seconds",
        "counter",
        "Application uptime in seconds",
        metrics.uptime_seconds(),
    );
    push_metric(
        &mut output,
        "http_requests_total",
        "counter",
        "Total HTTP requests",
        requests.total_requests,
    );
    push_metric(
        &mut output,
        "http_requests_success_total",
        "counter",
        "Successful HTTP requests",
        requests.success_count,
    );
    push_metric(
        &mut output,
        "http_requests_client_error_total",
        "counter",
        "Client error HTTP requests",
        requests.client_error_count,
    );
    push_metric(
        &mut output,
        "http_requests_server_error_total",
        "counter",
        "Server error HTTP requests",
        requests.server_error_count,
    );
    push_metric(
        &mut output,
        "http_requests_active",
        "gauge",
        "Current active HTTP requests",
        requests.active_requests,
    );
    push_metric(
        &mut output,
        "http_response_time_avg_ms",
        "gauge",
        "Average response time in milliseconds",
        format!("{:.2}", requests.avg_response_time_ms),
    );
    push_metric(
        &mut output,
        "mediation_forwarded_total",
        "counter",
        "Requests handed to a backend",
        mediation.forwarded,
    );
    push_metric(
        &mut output,
        "mediation_rate_limited_total",
        "counter",
        "Requests denied by tenant quota",
        mediation.rate_limited,
    );
    push_metric(
        &mut output,
        "mediation_chaos_failed_total",
        "counter",
        "Failures injected by fault injection",
        mediation.chaos_failed,
    );
    push_metric(
        &mut output,
        "mediation_chaos_dropped_total",
        "counter",
        "Requests dropped by fault injection",
        mediation.chaos_dropped,
    );
    push_metric(
        &mut output,
        "mediation_unauthorized_total",
        "counter",
        "Requests without a tenant",
        mediation.unauthorized,
    );
    push_metric(
        &mut output,
        "mediation_route_not_found_total",
        "counter",
        "Requests matching no route",
        mediation.route_not_found,
    );
    push_metric(
        &mut output,
        "mediation_store_unavailable_total",
        "counter",
        "Requests refused because the counter store failed",
        mediation.store_unavailable,
    );

    output
}
