//! Gateway HTTP presentation layer
//!
//! This crate provides the HTTP surface of the gateway: the mediated
//! fallback route, the fault injection admin API, and the health and
//! metrics endpoints.

pub mod app;
pub mod backend;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod tasks;

pub use app::{assemble_state, build_state};
pub use backend::{Backend, ProxyBackend};
pub use error::ApiError;
pub use handlers::metrics::MetricsCollector;
pub use middleware::{MetricsLayer, RequestIdLayer, TenantContextLayer};
pub use routes::create_router;
pub use server::serve;
pub use state::{AppState, BackendHandle};
pub use tasks::{spawn_counter_purger, spawn_fault_sweeper};
