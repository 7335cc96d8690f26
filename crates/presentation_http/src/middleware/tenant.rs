//! Tenant context middleware
//!
//! Resolves the tenant from the `X-Tenant-ID` header and attaches a
//! [`TenantContext`] to every request. Missing, empty or whitespace-only
//! values resolve to `None`; the pipeline decides what absence means.

use axum::{body::Body, extract::Request, response::Response};
use domain::TenantId;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// The header carrying the tenant identifier
pub const TENANT_ID_HEADER: &str = "X-Tenant-ID";

/// Tenant resolved for the current request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantContext(pub Option<TenantId>);

impl TenantContext {
    /// Resolved tenant, if any
    #[must_use]
    pub const fn tenant(&self) -> Option<&TenantId> {
        self.0.as_ref()
    }
}

/// Layer that attaches [`TenantContext`] to requests
#[derive(Debug, Clone, Default)]
pub struct TenantContextLayer;

impl TenantContextLayer {
    /// Create a new tenant context layer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TenantContextLayer {
    type Service = TenantContextService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TenantContextService { inner }
    }
}

/// Service that resolves the tenant header
#[derive(Debug, Clone)]
pub struct TenantContextService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for TenantContextService<S>
where
    S: Service<Request<Body>, Response = Response<Body>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let tenant = request
            .headers()
            .get(TENANT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| TenantId::parse(s).ok());

        request.extensions_mut().insert(TenantContext(tenant));
        self.inner.call(request)
    }
}

#[cfg(test)]
mod tests {
    use axum::{Extension, Router, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn echo(Extension(ctx): Extension<TenantContext>) -> String {
        ctx.tenant()
            .map_or_else(|| "<none>".to_string(), ToString::to_string)
    }

    async fn call(header: Option<&str>) -> String {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(TENANT_ID_HEADER, value);
        }
        let response = Router::new()
            .route("/", get(echo))
            .layer(TenantContextLayer::new())
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn resolves_tenant_header() {
        assert_eq!(call(Some("acme")).await, "acme");
    }

    #[tokio::test]
    async fn missing_header_is_absent() {
        assert_eq!(call(None).await, "<none>");
    }

    #[tokio::test]
    async fn blank_header_is_absent() {
        assert_eq!(call(Some("")).await, "<none>");
        assert_eq!(call(Some("   ")).await, "<none>");
    }

    #[test]
    fn default_context_has_no_tenant() {
        assert!(TenantContext::default().tenant().is_none());
    }
}
