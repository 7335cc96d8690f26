//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    handlers,
    middleware::{MetricsLayer, RequestIdLayer, TenantContextLayer},
    state::AppState,
};

/// Create the main router with all routes
///
/// Health, metrics and admin endpoints bypass mediation; every other path
/// falls through to the gateway pipeline.
pub fn create_router(state: AppState) -> Router {
    let metrics = MetricsLayer::new(state.metrics.clone());

    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health::health_check))
        // Metrics endpoints
        .route("/metrics", get(handlers::metrics::get_metrics))
        .route("/metrics/prometheus", get(handlers::metrics::get_metrics_prometheus))
        // Fault injection admin API
        .route("/admin/chaos", get(handlers::chaos_admin::get_chaos))
        .route(
            "/admin/chaos/enable",
            post(handlers::chaos_admin::enable_chaos),
        )
        .route(
            "/admin/chaos/disable",
            post(handlers::chaos_admin::disable_chaos),
        )
        // Everything else is mediated
        .fallback(handlers::gateway::handle)
        // Request annotation (first added = innermost)
        .layer(TenantContextLayer::new())
        .layer(RequestIdLayer::new())
        .layer(metrics)
        // Attach state
        .with_state(state)
}
