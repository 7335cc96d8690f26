//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: the shared counter
//! store (in-memory or Redis) and the decision sink. Also owns
//! configuration loading and logging initialisation.

pub mod adapters;
pub mod config;
pub mod telemetry;

pub use adapters::*;
pub use config::{
    AdmissionAppConfig, AppConfig, ChaosAppConfig, CounterStoreBackend, CounterStoreConfig,
    LogFormat, RouteConfig, ServerConfig,
};
pub use telemetry::{PrometheusHandle, init_logging, init_metrics};
