//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP server settings
//! - `admission`: per-tenant quota
//! - `chaos`: fault policy sweeper and drop handling
//! - `counter_store`: quota counter backend
//! - `routes`: ordered backend route table

mod admission;
mod chaos;
mod counter_store;
mod routes;
mod server;

use domain::DomainError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use admission::AdmissionAppConfig;
pub use chaos::ChaosAppConfig;
pub use counter_store::{CounterStoreBackend, CounterStoreConfig};
pub use routes::{RouteConfig, default_routes};
pub use server::{LogFormat, ServerConfig};

/// Base name of the optional configuration file (`gateway.toml`, `gateway.yaml`, ...)
pub const CONFIG_FILE_STEM: &str = "gateway";

/// Prefix of overriding environment variables
pub const ENV_PREFIX: &str = "GATEWAY";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Admission control configuration
    #[serde(default)]
    pub admission: AdmissionAppConfig,

    /// Fault injection runtime configuration
    #[serde(default)]
    pub chaos: ChaosAppConfig,

    /// Quota counter store
    #[serde(default)]
    pub counter_store: CounterStoreConfig,

    /// Backend routes in match order
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            admission: AdmissionAppConfig::default(),
            chaos: ChaosAppConfig::default(),
            counter_store: CounterStoreConfig::default(),
            routes: default_routes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// Sources, later ones winning: built-in defaults, an optional
    /// `gateway.*` file in the working directory, then `GATEWAY_*`
    /// environment variables with `__` separating nested keys
    /// (e.g. `GATEWAY_ADMISSION__LIMIT=10`).
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name(CONFIG_FILE_STEM).required(false))
            // Override with environment variables
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        info!(
            routes = config.routes.len(),
            limit = config.admission.limit,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse configuration from a TOML document, without consulting the environment
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Check values the type system cannot
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.admission.limit == 0 {
            return Err(DomainError::ValidationError(
                "admission.limit must be at least 1".to_string(),
            ));
        }
        if self.admission.refill_window_secs == 0 {
            return Err(DomainError::ValidationError(
                "admission.refill_window_secs must be at least 1".to_string(),
            ));
        }
        if self.counter_store.backend == CounterStoreBackend::Redis
            && self.counter_store.redis_url.trim().is_empty()
        {
            return Err(DomainError::ValidationError(
                "counter_store.redis_url is required for the redis backend".to_string(),
            ));
        }
        for route in &self.routes {
            if !route.prefix.starts_with('/') {
                return Err(DomainError::InvalidRoutePrefix(route.prefix.clone()));
            }
            if route.target.trim().is_empty() {
                return Err(DomainError::ValidationError(format!(
                    "route {} has an empty target",
                    route.prefix
                )));
            }
        }
        debug!("Configuration validated");
        Ok(())
    }
}
