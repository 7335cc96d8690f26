//! Decision sink port
//!
//! The audit trail of the gateway: every stage hands its decision events to
//! this port. Emission is fire-and-forget; a sink must never fail the request.

use domain::DecisionEvent;
#[cfg(test)]
use mockall::automock;

/// Port accepting structured decision events
#[cfg_attr(test, automock)]
pub trait DecisionSinkPort: Send + Sync + std::fmt::Debug {
    /// Record one decision event
    fn emit(&self, event: DecisionEvent);
}
