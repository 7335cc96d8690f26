//! Value Objects - Immutable, identity-less domain primitives

mod percentage;
mod tenant_id;

pub use percentage::Percentage;
pub use tenant_id::TenantId;
