//! Request context carried through the mediation stages
//!
//! `RequestContext` is built by the HTTP layer from the inbound request and
//! the extensions attached by upstream middleware (tenant resolution,
//! request-id propagation). Stages only ever read it.
//!
//! # Examples
//!
//! ```
//! use application::RequestContext;
//! use domain::TenantId;
//!
//! let ctx = RequestContext::new("GET", "/orders/7")
//!     .with_tenant(TenantId::parse("t1").unwrap())
//!     .with_request_id("req-123");
//!
//! assert_eq!(ctx.path(), "/orders/7");
//! assert_eq!(ctx.tenant().map(TenantId::as_str), Some("t1"));
//! ```

use chrono::{DateTime, Utc};
use domain::{DecisionEvent, DecisionKind, TenantId};

/// Per-request metadata read by every pipeline stage
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: String,
    path: String,
    tenant: Option<TenantId>,
    request_id: Option<String>,
    received_at: DateTime<Utc>,
}

impl RequestContext {
    /// Create a context for a request with no tenant and no request id
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            tenant: None,
            request_id: None,
            received_at: Utc::now(),
        }
    }

    /// Attach the resolved tenant
    #[must_use]
    pub fn with_tenant(mut self, tenant: TenantId) -> Self {
        self.tenant = Some(tenant);
        self
    }

    /// Attach the propagated request identifier
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolved tenant, if any
    pub const fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    /// Propagated request identifier, if any
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// When the gateway received the request
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Start a decision event pre-filled with this request's metadata
    #[must_use]
    pub fn event(&self, decision: DecisionKind, reason: impl Into<String>) -> DecisionEvent {
        let mut event = DecisionEvent::new(decision, reason)
            .with_method(self.method.as_str())
            .with_route(self.path.as_str());
        if let Some(tenant) = &self.tenant {
            event = event.with_tenant(tenant.as_str());
        }
        if let Some(request_id) = &self.request_id {
            event = event.with_request_id(request_id.as_str());
        }
        event
    }
}
