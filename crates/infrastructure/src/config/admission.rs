//! Admission control configuration.

use std::time::Duration;

use application::{AdmissionConfig, StoreFailureMode};
use serde::{Deserialize, Serialize};

/// Per-tenant fixed-window quota settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionAppConfig {
    /// Requests admitted per tenant per window
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Window length in seconds
    #[serde(default = "default_refill_window")]
    pub refill_window_secs: u64,

    /// Namespace of counter keys
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// `closed` denies, `open` admits when the counter store fails
    #[serde(default)]
    pub on_store_error: StoreFailureMode,
}

const fn default_limit() -> u32 {
    5
}

const fn default_refill_window() -> u64 {
    60
}

fn default_key_prefix() -> String {
    "ratelimit".to_string()
}

impl Default for AdmissionAppConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            refill_window_secs: default_refill_window(),
            key_prefix: default_key_prefix(),
            on_store_error: StoreFailureMode::default(),
        }
    }
}

impl AdmissionAppConfig {
    /// Convert to the controller's configuration
    #[must_use]
    pub fn to_admission_config(&self) -> AdmissionConfig {
        AdmissionConfig {
            limit: self.limit,
            window: Duration::from_secs(self.refill_window_secs),
            key_prefix: self.key_prefix.clone(),
            on_store_error: self.on_store_error,
        }
    }
}
