//! Decision sink writing to the `decision` tracing target
//!
//! Each event becomes one log record whose `event` field holds the event
//! serialised as a single JSON document. Routing, filtering and formatting
//! are left to the installed subscriber.

use application::ports::DecisionSinkPort;
use domain::DecisionEvent;
use tracing::{info, warn};

/// Tracing target carrying decision events
pub const DECISION_TARGET: &str = "decision";

/// Audit sink backed by `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDecisionSink;

impl TracingDecisionSink {
    /// Create a new sink
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DecisionSinkPort for TracingDecisionSink {
    fn emit(&self, event: DecisionEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => info!(
                target: DECISION_TARGET,
                decision = %event.decision,
                event = %json,
                "{}",
                event.reason
            ),
            Err(e) => warn!(
                target: DECISION_TARGET,
                decision = %event.decision,
                error = %e,
                "Failed to serialize decision event"
            ),
        }
    }
}
