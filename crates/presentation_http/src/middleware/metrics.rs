//! Request metrics middleware
//!
//! Counts every request and its status class into a shared
//! [`MetricsCollector`], together with its latency.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};

use axum::{body::Body, extract::Request, response::Response};
use tower::{Layer, Service};

use crate::handlers::metrics::MetricsCollector;

/// Layer recording request totals and latency
#[derive(Debug, Clone)]
pub struct MetricsLayer {
    collector: Arc<MetricsCollector>,
}

impl MetricsLayer {
    /// Record into `collector`
    #[must_use]
    pub const fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            collector: self.collector.clone(),
        }
    }
}

/// Service wrapping each call with start and end hooks
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
    collector: Arc<MetricsCollector>,
}

impl<S> Service<Request<Body>> for MetricsService<S>
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

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let collector = self.collector.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let started = Instant::now();
            collector.request_start();
            let result = inner.call(request).await;
            let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            // Errors never reach here from axum routers; count them as 500
            let status = result.as_ref().map_or(500, |r| r.status().as_u16());
            collector.request_end(elapsed_us, status);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app(collector: Arc<MetricsCollector>) -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/busy", get(|| async { StatusCode::TOO_MANY_REQUESTS }))
            .route("/down", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .layer(MetricsLayer::new(collector))
    }

    #[tokio::test]
    async fn counts_requests_by_status_class() {
        let collector = Arc::new(MetricsCollector::new());

        for uri in ["/ok", "/busy", "/down"] {
            app(collector.clone())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
        }

        let metrics = collector.request_metrics();
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.success_count, 1);
        assert_eq!(metrics.client_error_count, 1);
        assert_eq!(metrics.server_error_count, 1);
        assert_eq!(metrics.active_requests, 0);
    }
}
