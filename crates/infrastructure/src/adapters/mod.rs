//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod in_memory_counter_store;
mod recording_decision_sink;
mod redis_counter_store;
mod tracing_decision_sink;

pub use in_memory_counter_store::{DEFAULT_PURGE_INTERVAL, InMemoryCounterStore};
pub use recording_decision_sink::RecordingDecisionSink;
pub use redis_counter_store::RedisCounterStore;
pub use tracing_decision_sink::{DECISION_TARGET, TracingDecisionSink};
