//! Application state shared across handlers

use std::sync::Arc;
use std::time::Duration;

use application::{FaultInjector, GatewayPipeline};
use infrastructure::PrometheusHandle;

use crate::backend::Backend;
use crate::handlers::metrics::MetricsCollector;

/// Backend handle bound to a route prefix
pub type BackendHandle = Arc<dyn Backend>;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Mediation pipeline with its route table
    pub pipeline: Arc<GatewayPipeline<BackendHandle>>,
    /// Owner of the process-wide fault policy, shared with the admin surface
    pub fault_injector: Arc<FaultInjector>,
    /// How long a dropped request holds its connection
    pub drop_hold: Duration,
    /// Request and mediation totals
    pub metrics: Arc<MetricsCollector>,
    /// Installed Prometheus recorder, rendered by `/metrics/prometheus`
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Attach the process-wide Prometheus recorder
    #[must_use]
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
