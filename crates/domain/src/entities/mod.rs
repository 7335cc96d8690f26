//! Domain entities - Records and policies with a lifecycle

mod decision_event;
mod fault_policy;
mod route_binding;

pub use decision_event::{DecisionEvent, DecisionKind};
pub use fault_policy::FaultPolicy;
pub use route_binding::RouteBinding;
