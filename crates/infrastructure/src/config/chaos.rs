//! Fault injection runtime settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sweeper cadence and drop handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaosAppConfig {
    /// Interval between expiry sweeps in milliseconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,

    /// How long a dropped request holds its connection, in seconds
    #[serde(default = "default_drop_hold")]
    pub drop_hold_secs: u64,
}

const fn default_sweep_interval() -> u64 {
    1000
}

const fn default_drop_hold() -> u64 {
    300
}

impl Default for ChaosAppConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: default_sweep_interval(),
            drop_hold_secs: default_drop_hold(),
        }
    }
}

impl ChaosAppConfig {
    /// Sweep interval, never shorter than one millisecond
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }

    /// Drop hold duration
    #[must_use]
    pub const fn drop_hold(&self) -> Duration {
        Duration::from_secs(self.drop_hold_secs)
    }
}
