//! Composition root
//!
//! Builds the shared [`AppState`] from configuration: one backend per
//! configured route, a fault injector, an admission controller over the
//! given counter store, and the pipeline tying them together.

use std::sync::Arc;
use std::time::Duration;

use application::{
    AdmissionConfig, AdmissionController, ApplicationError, CounterStorePort, DecisionSinkPort,
    Dispatcher, FaultInjector, GatewayPipeline,
};
use infrastructure::AppConfig;
use tracing::info;

use crate::backend::ProxyBackend;
use crate::handlers::metrics::MetricsCollector;
use crate::state::{AppState, BackendHandle};

/// Build state with a reverse proxy for every configured route
pub fn build_state(
    config: &AppConfig,
    store: Arc<dyn CounterStorePort>,
    sink: Arc<dyn DecisionSinkPort>,
) -> Result<AppState, ApplicationError> {
    let mut backends = Vec::with_capacity(config.routes.len());
    for route in &config.routes {
        let backend: BackendHandle = Arc::new(ProxyBackend::new(
            route.target.clone(),
            config.server.max_body_size_bytes,
        )?);
        info!(prefix = %route.prefix, target = %route.target, "Route registered");
        backends.push((route.prefix.clone(), backend));
    }

    assemble_state(
        config.admission.to_admission_config(),
        config.chaos.drop_hold(),
        store,
        sink,
        backends,
    )
}

/// Build state from explicit backends, in match order
pub fn assemble_state(
    admission: AdmissionConfig,
    drop_hold: Duration,
    store: Arc<dyn CounterStorePort>,
    sink: Arc<dyn DecisionSinkPort>,
    backends: Vec<(String, BackendHandle)>,
) -> Result<AppState, ApplicationError> {
    let mut dispatcher = Dispatcher::new(sink.clone());
    for (prefix, backend) in backends {
        dispatcher.bind(prefix, backend)?;
    }

    let fault_injector = Arc::new(FaultInjector::new(sink.clone()));
    let admission = Arc::new(AdmissionController::new(store, sink.clone(), admission));
    let pipeline = GatewayPipeline::new(dispatcher, fault_injector.clone(), admission, sink);

    Ok(AppState {
        pipeline: Arc::new(pipeline),
        fault_injector,
        drop_hold,
        metrics: Arc::new(MetricsCollector::new()),
        prometheus: None,
    })
}

#[cfg(test)]
mod tests {
    use infrastructure::{InMemoryCounterStore, RecordingDecisionSink, RouteConfig};

    use super::*;

    #[test]
    fn builds_one_binding_per_route() {
        let state = build_state(
            &AppConfig::default(),
            Arc::new(InMemoryCounterStore::new()),
            Arc::new(RecordingDecisionSink::new()),
        )
        .unwrap();

        let prefixes: Vec<_> = state
            .pipeline
            .dispatcher()
            .bindings()
            .iter()
            .map(|b| b.prefix().to_string())
            .collect();
        assert_eq!(prefixes, vec!["/users", "/orders"]);
        assert_eq!(state.drop_hold, Duration::from_secs(300));
        assert_eq!(
            state.pipeline.stage_names(),
            vec!["fault_injection", "admission"]
        );
    }

    #[test]
    fn rejects_relative_route_prefix() {
        let config = AppConfig {
            routes: vec![RouteConfig::new("users", "http://localhost:9001")],
            ..AppConfig::default()
        };
        let result = build_state(
            &config,
            Arc::new(InMemoryCounterStore::new()),
            Arc::new(RecordingDecisionSink::new()),
        );
        assert!(matches!(result, Err(ApplicationError::Domain(_))));
    }
}
