//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod counter_store;
mod decision_sink;

#[cfg(test)]
pub use counter_store::MockCounterStorePort;
pub use counter_store::{CounterStorePort, QuotaReading};
#[cfg(test)]
pub use decision_sink::MockDecisionSinkPort;
pub use decision_sink::DecisionSinkPort;
