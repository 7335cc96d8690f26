//! Logging and metrics initialisation
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` (honouring
//! `RUST_LOG`) feeding either a text or a JSON formatting layer. Labelled
//! metrics go to a Prometheus recorder rendered by the HTTP layer.

mod logging;
pub mod metrics;

pub use logging::{DEFAULT_LOG_FILTER, LoggingError, init_logging};
pub use self::metrics::{MetricsError, PrometheusHandle, init_metrics};
