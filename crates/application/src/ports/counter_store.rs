//! Shared counter store port
//!
//! Defines the interface to the external key-value service that holds
//! per-tenant quota counters. Implementations may be in-process (tests,
//! single-node deployments) or networked (Redis and similar).

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Result of one quota acquisition attempt against a window counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaReading {
    /// Key was absent; it now holds `remaining` and expires after the window
    Initialized {
        /// Tokens left after this request
        remaining: i64,
    },
    /// Key was positive and has been decremented
    Decremented {
        /// Tokens left after this request
        remaining: i64,
    },
    /// Key was zero or below; nothing was changed
    Exhausted {
        /// Value currently held by the key
        remaining: i64,
    },
}

impl QuotaReading {
    /// Tokens left in the window
    pub const fn remaining(&self) -> i64 {
        match self {
            Self::Initialized { remaining }
            | Self::Decremented { remaining }
            | Self::Exhausted { remaining } => *remaining,
        }
    }

    /// Whether the request consumed a token
    pub const fn is_allowed(&self) -> bool {
        !matches!(self, Self::Exhausted { .. })
    }
}

/// Port for the shared counter store
///
/// Keys expire after the TTL given to [`CounterStorePort::set`]; an expired
/// key reads as absent.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CounterStorePort: Send + Sync + std::fmt::Debug {
    /// Read a counter; `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<i64>, ApplicationError>;

    /// Write a counter with a time-to-live, replacing any previous value and TTL
    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), ApplicationError>;

    /// Decrement a counter and return the new value
    ///
    /// Decrementing an absent key stores `-1` without expiry.
    async fn decrement(&self, key: &str) -> Result<i64, ApplicationError>;

    /// Consume one token from a fixed-window counter
    ///
    /// The provided implementation is a plain check-then-act sequence over
    /// `get`, `set` and `decrement`. It is NOT atomic: concurrent callers for
    /// the same key can both observe a positive value before either
    /// decrements, admitting more than `limit` requests per window. Adapters
    /// that can evaluate the whole sequence atomically must override it.
    async fn acquire(
        &self,
        key: &str,
        limit: i64,
        window: Duration,
    ) -> Result<QuotaReading, ApplicationError> {
        match self.get(key).await? {
            None => {
                let remaining = limit - 1;
                self.set(key, remaining, window).await?;
                Ok(QuotaReading::Initialized { remaining })
            },
            Some(value) if value <= 0 => Ok(QuotaReading::Exhausted { remaining: value }),
            Some(_) => {
                let remaining = self.decrement(key).await?;
                Ok(QuotaReading::Decremented { remaining })
            },
        }
    }
}
