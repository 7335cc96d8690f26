//! Gateway HTTP server binary

use std::sync::Arc;
use std::time::Duration;

use application::ports::{CounterStorePort, DecisionSinkPort};
use infrastructure::{
    AppConfig, CounterStoreBackend, InMemoryCounterStore, RedisCounterStore, TracingDecisionSink,
    init_logging, init_metrics,
};
use presentation_http::{build_state, create_router, serve, spawn_counter_purger, spawn_fault_sweeper};
use tokio::{net::TcpListener, signal, task::JoinHandle};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialize tracing
    init_logging(config.server.log_format)?;
    if let Some(e) = load_error {
        tracing::warn!("Failed to load config, using defaults: {}", e);
    }
    config.validate()?;

    info!("Gateway v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        host = %config.server.host,
        port = %config.server.port,
        limit = config.admission.limit,
        window_secs = config.admission.refill_window_secs,
        "Configuration loaded"
    );

    let prometheus = init_metrics()?;

    // Select the counter store; only the in-memory one needs purging
    let mut purger: Option<JoinHandle<()>> = None;
    let store: Arc<dyn CounterStorePort> = match config.counter_store.backend {
        CounterStoreBackend::Memory => {
            let interval = config.counter_store.purge_interval();
            let store = Arc::new(InMemoryCounterStore::with_purge_interval(interval));
            purger = Some(spawn_counter_purger(store.clone(), interval));
            store
        },
        CounterStoreBackend::Redis => {
            Arc::new(RedisCounterStore::connect(&config.counter_store.redis_url).await?)
        },
    };
    info!(backend = ?config.counter_store.backend, "Counter store ready");

    let sink: Arc<dyn DecisionSinkPort> = Arc::new(TracingDecisionSink::new());
    let state = build_state(&config, store, sink)?.with_prometheus(prometheus);

    // Start the fault policy sweeper
    let sweeper = spawn_fault_sweeper(state.fault_injector.clone(), config.chaos.sweep_interval());

    // Build router; first added = innermost
    let app = create_router(state)
        .layer(RequestBodyLimitLayer::new(config.server.max_body_size_bytes))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server listening on http://{}", addr);

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    serve(listener, app, shutdown_signal(), shutdown_timeout).await?;

    sweeper.abort();
    if let Some(purger) = purger {
        purger.abort();
    }
    info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
