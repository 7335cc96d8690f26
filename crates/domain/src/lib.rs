//! Domain layer for the tenant gateway
//!
//! Contains the decision vocabulary of the request-mediation core: tenant
//! identities, fault policies, route bindings and decision events.
//! This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
