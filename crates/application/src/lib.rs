//! Application layer - Request mediation use cases
//!
//! Contains the decision stages of the gateway (fault injection, admission
//! control, prefix dispatch), the pipeline that composes them, and the port
//! definitions for the shared counter store and the decision audit sink.

pub mod error;
pub mod ports;
pub mod request_context;
pub mod services;
#[cfg(test)]
pub(crate) mod testing;

pub use error::ApplicationError;
pub use ports::*;
pub use request_context::RequestContext;
pub use services::*;
