//! Counter store selection.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which counter store holds the quota counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterStoreBackend {
    /// In-process map; quotas are per replica
    #[default]
    Memory,
    /// Shared Redis server
    Redis,
}

/// Counter store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterStoreConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: CounterStoreBackend,

    /// Connection URL, used by the `redis` backend
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Interval between purges of expired in-memory counters, in seconds
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

const fn default_purge_interval() -> u64 {
    60
}

impl Default for CounterStoreConfig {
    fn default() -> Self {
        Self {
            backend: CounterStoreBackend::default(),
            redis_url: default_redis_url(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

impl CounterStoreConfig {
    /// Purge interval, never shorter than one second
    #[must_use]
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs.max(1))
    }
}
