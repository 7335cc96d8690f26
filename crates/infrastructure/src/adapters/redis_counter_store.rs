//! Redis-backed shared counter store
//!
//! Counters live in Redis with a millisecond TTL, so every gateway replica
//! pointed at the same server shares one quota per tenant. `acquire` runs as
//! a single Lua script, which Redis executes atomically.

use std::fmt;
use std::time::Duration;

use application::{
    error::ApplicationError,
    ports::{CounterStorePort, QuotaReading},
};
use async_trait::async_trait;
use redis::{AsyncCommands, RedisError, Script, aio::ConnectionManager};
use tracing::{debug, info, instrument};

/// Check-then-decrement over one key
///
/// Replies `{state, remaining}` where state is 0 for a freshly initialised
/// key, 1 for a decrement and 2 for an exhausted key left untouched.
const ACQUIRE_SCRIPT: &str = r"
local v = redis.call('GET', KEYS[1])
if not v then
    local remaining = tonumber(ARGV[1]) - 1
    redis.call('SET', KEYS[1], remaining, 'PX', ARGV[2])
    return {0, remaining}
end
v = tonumber(v)
if v <= 0 then
    return {2, v}
end
return {1, redis.call('DECR', KEYS[1])}
";

/// Counter store over a multiplexed, auto-reconnecting Redis connection
pub struct RedisCounterStore {
    conn: ConnectionManager,
    acquire: Script,
    url: String,
}

impl fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("url", &redacted(&self.url))
            .finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    /// Connect to the server at `url` (`redis://host:port/db`)
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Configuration`] if the URL is invalid and
    /// [`ApplicationError::CounterStore`] if the server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, ApplicationError> {
        let client = redis::Client::open(url)
            .map_err(|e| ApplicationError::Configuration(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client).await.map_err(store_error)?;

        info!(url = %redacted(url), "Connected to Redis counter store");
        Ok(Self {
            conn,
            acquire: Script::new(ACQUIRE_SCRIPT),
            url: url.to_string(),
        })
    }
}

fn store_error(e: RedisError) -> ApplicationError {
    ApplicationError::CounterStore(e.to_string())
}

/// Strip credentials from a connection URL before logging it
fn redacted(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => {
            format!("{}***{}", &url[..scheme + 3], &url[at..])
        },
        _ => url.to_string(),
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Decode the `{state, remaining}` reply of the acquire script
fn reading_from_reply(state: i64, remaining: i64) -> Result<QuotaReading, ApplicationError> {
    match state {
        0 => Ok(QuotaReading::Initialized { remaining }),
        1 => Ok(QuotaReading::Decremented { remaining }),
        2 => Ok(QuotaReading::Exhausted { remaining }),
        other => Err(ApplicationError::CounterStore(format!(
            "unexpected acquire reply state {other}"
        ))),
    }
}

#[async_trait]
impl CounterStorePort for RedisCounterStore {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<i64>, ApplicationError> {
        let mut conn = self.conn.clone();
        let value: Option<i64> = conn.get(key).await.map_err(store_error)?;
        Ok(value)
    }

    #[instrument(skip(self), level = "debug")]
    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), ApplicationError> {
        let mut conn = self.conn.clone();
        conn.pset_ex::<_, _, ()>(key, value, ttl_millis(ttl))
            .await
            .map_err(store_error)
    }

    #[instrument(skip(self), level = "debug")]
    async fn decrement(&self, key: &str) -> Result<i64, ApplicationError> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.decr(key, 1).await.map_err(store_error)?;
        Ok(value)
    }

    #[instrument(skip(self), level = "debug")]
    async fn acquire(
        &self,
        key: &str,
        limit: i64,
        window: Duration,
    ) -> Result<QuotaReading, ApplicationError> {
        let mut conn = self.conn.clone();
        let (state, remaining): (i64, i64) = self
            .acquire
            .key(key)
            .arg(limit)
            .arg(ttl_millis(window))
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;

        let reading = reading_from_reply(state, remaining)?;
        debug!(key = %key, remaining = reading.remaining(), "Quota acquired");
        Ok(reading)
    }
}
