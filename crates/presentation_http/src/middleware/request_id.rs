//! Request ID middleware for HTTP request correlation
//!
//! Propagates the caller's `X-Request-ID` header as an opaque string: it is
//! stored in request extensions, recorded on the request span and echoed on
//! the response. No id is generated when the header is absent.

use axum::{body::Body, extract::Request, http::header::HeaderValue, response::Response};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::Instrument;

/// The header name for the request ID
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Layer that adds request ID propagation to HTTP services
#[derive(Debug, Clone, Default)]
pub struct RequestIdLayer;

impl RequestIdLayer {
    /// Create a new request ID layer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Service that propagates an inbound request ID
#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| RequestId(s.to_string()));

        if let Some(id) = &request_id {
            request.extensions_mut().insert(id.clone());
        }

        let span = tracing::info_span!(
            "http_request",
            request_id = request_id.as_ref().map_or("", RequestId::as_str),
            method = %request.method(),
            uri = %request.uri().path(),
        );

        let mut inner = self.inner.clone();

        Box::pin(
            async move {
                let mut response = inner.call(request).await?;

                if let Some(id) = request_id {
                    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
                        response.headers_mut().insert(REQUEST_ID_HEADER, value);
                    }
                }

                Ok(response)
            }
            .instrument(span),
        )
    }
}

/// Request ID propagated from the inbound header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Get the request ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use axum::{Extension, Router, http::StatusCode, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn echo(request_id: Option<Extension<RequestId>>) -> String {
        request_id.map_or_else(|| "none".to_string(), |Extension(id)| id.to_string())
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo))
            .layer(RequestIdLayer::new())
    }

    #[test]
    fn request_id_layer_new() {
        let layer = RequestIdLayer::new();
        assert!(std::mem::size_of_val(&layer) == 0); // Zero-sized type
    }

    #[test]
    fn request_id_display() {
        let id = RequestId("abc-123".to_string());
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(id.as_str(), "abc-123");
    }

    #[tokio::test]
    async fn propagates_and_echoes_header() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, "not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "not-a-uuid");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"not-a-uuid");
    }

    #[tokio::test]
    async fn does_not_generate_missing_id() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().get(REQUEST_ID_HEADER).is_none());
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"none");
    }
}
