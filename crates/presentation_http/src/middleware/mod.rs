//! HTTP middleware components
//!
//! Request-id propagation, tenant resolution and request metrics. None of
//! them rejects anything.

pub mod metrics;
pub mod request_id;
pub mod tenant;

pub use self::metrics::MetricsLayer;
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
pub use tenant::{TENANT_ID_HEADER, TenantContext, TenantContextLayer};
