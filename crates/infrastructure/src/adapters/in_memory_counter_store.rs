//! In-process shared counter store
//!
//! Counters with per-key TTL held in a single mutex-guarded map. Suitable for
//! single-node deployments and tests. `acquire` runs the whole
//! check-then-decrement sequence inside one critical section, so concurrent
//! callers for the same key can never admit more than `limit` requests per
//! window.
//!
//! Expired keys are dropped lazily when read and in bulk whenever a new key
//! is written after the purge interval has elapsed, so keys that are never
//! touched again do not accumulate.

use std::collections::HashMap;
use std::time::Duration;

use application::{
    error::ApplicationError,
    ports::{CounterStorePort, QuotaReading},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::telemetry::metrics::COUNTER_KEYS;

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: i64,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live_at(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// Default spacing of bulk purges triggered by writes
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Entries {
    map: HashMap<String, Entry>,
    next_purge: Instant,
}

impl Entries {
    #[allow(clippy::cast_precision_loss)]
    fn purge(&mut self, now: Instant, interval: Duration) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| entry.is_live_at(now));
        self.next_purge = now + interval;
        metrics::gauge!(COUNTER_KEYS).set(self.map.len() as f64);
        before - self.map.len()
    }

    /// Insert a key that was absent, purging first if one is due
    fn insert_new(&mut self, key: &str, entry: Entry, now: Instant, interval: Duration) {
        if now >= self.next_purge {
            let purged = self.purge(now, interval);
            if purged > 0 {
                debug!(purged, "Expired counters purged");
            }
        }
        self.map.insert(key.to_string(), entry);
    }
}

/// Mutex-guarded counter map with lazy expiry
#[derive(Debug)]
pub struct InMemoryCounterStore {
    entries: Mutex<Entries>,
    purge_interval: Duration,
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::with_purge_interval(DEFAULT_PURGE_INTERVAL)
    }
}

impl InMemoryCounterStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store purging at most once per `interval` on writes
    #[must_use]
    pub fn with_purge_interval(interval: Duration) -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                next_purge: Instant::now() + interval,
            }),
            purge_interval: interval,
        }
    }

    /// Drop every expired key; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        self.entries.lock().purge(Instant::now(), self.purge_interval)
    }

    /// Number of keys held, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.lock().map.is_empty()
    }

    fn live_value(entries: &mut Entries, key: &str, now: Instant) -> Option<i64> {
        match entries.map.get(key) {
            Some(entry) if entry.is_live_at(now) => Some(entry.value),
            Some(_) => {
                entries.map.remove(key);
                None
            },
            None => None,
        }
    }
}

#[async_trait]
impl CounterStorePort for InMemoryCounterStore {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<i64>, ApplicationError> {
        let mut entries = self.entries.lock();
        Ok(Self::live_value(&mut entries, key, Instant::now()))
    }

    #[instrument(skip(self), level = "debug")]
    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), ApplicationError> {
        let now = Instant::now();
        let entry = Entry {
            value,
            expires_at: Some(now + ttl),
        };
        let mut entries = self.entries.lock();
        if entries.map.contains_key(key) {
            entries.map.insert(key.to_string(), entry);
        } else {
            entries.insert_new(key, entry, now, self.purge_interval);
        }
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn decrement(&self, key: &str) -> Result<i64, ApplicationError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let value = match Self::live_value(&mut entries, key, now) {
            Some(value) => value - 1,
            None => -1,
        };
        match entries.map.get_mut(key) {
            Some(entry) => entry.value = value,
            None => {
                let entry = Entry {
                    value,
                    expires_at: None,
                };
                entries.insert_new(key, entry, now, self.purge_interval);
            },
        }
        Ok(value)
    }

    #[instrument(skip(self), level = "debug")]
    async fn acquire(
        &self,
        key: &str,
        limit: i64,
        window: Duration,
    ) -> Result<QuotaReading, ApplicationError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let reading = match Self::live_value(&mut entries, key, now) {
            None => {
                let remaining = limit - 1;
                let entry = Entry {
                    value: remaining,
                    expires_at: Some(now + window),
                };
                entries.insert_new(key, entry, now, self.purge_interval);
                QuotaReading::Initialized { remaining }
            },
            Some(value) if value <= 0 => QuotaReading::Exhausted { remaining: value },
            Some(_) => {
                let entry = entries.map.get_mut(key).ok_or_else(|| {
                    ApplicationError::Internal(format!("counter {key} vanished under lock"))
                })?;
                entry.value -= 1;
                QuotaReading::Decremented {
                    remaining: entry.value,
                }
            },
        };
        drop(entries);

        debug!(key = %key, remaining = reading.remaining(), "Quota acquired");
        Ok(reading)
    }
}
