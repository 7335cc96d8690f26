//! Gateway handler - Every non-admin request enters the pipeline here

use std::time::{Duration, Instant};

use application::{PipelineDecision, RequestContext};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::{RouteBinding, TenantId};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::handlers::metrics::MediationOutcome;
use crate::middleware::{RequestId, TenantContext};
use crate::state::AppState;

/// Build the pipeline's view of the request from headers resolved upstream
pub fn request_context(request: &Request) -> RequestContext {
    let mut ctx = RequestContext::new(request.method().as_str(), request.uri().path());
    if let Some(tenant) = request
        .extensions()
        .get::<TenantContext>()
        .and_then(TenantContext::tenant)
    {
        ctx = ctx.with_tenant(tenant.clone());
    }
    if let Some(request_id) = request.extensions().get::<RequestId>() {
        ctx = ctx.with_request_id(request_id.as_str());
    }
    ctx
}

/// Route label for requests no binding matched
const UNMATCHED_ROUTE: &str = "unmatched";

/// Tenant label for requests without a tenant
const ANONYMOUS_TENANT: &str = "anonymous";

/// Mediate and, if admitted, forward the request
pub async fn handle(State(state): State<AppState>, request: Request) -> Response {
    let started = Instant::now();
    let ctx = request_context(&request);
    let route = state
        .pipeline
        .dispatcher()
        .lookup(ctx.path())
        .map_or(UNMATCHED_ROUTE, RouteBinding::prefix)
        .to_string();
    let tenant = ctx.tenant().map_or(ANONYMOUS_TENANT, TenantId::as_str);

    let decision = state.pipeline.handle(&ctx).await;
    let outcome = MediationOutcome::of(&decision);
    let record = |status: StatusCode| {
        state
            .metrics
            .record_mediation(&route, tenant, outcome, status.as_u16(), started.elapsed());
    };

    let response = match decision {
        PipelineDecision::Forward(binding) => {
            let backend = binding.handler().clone();
            match backend.forward(request).await {
                Ok(response) => response,
                Err(e) => e.into_response(),
            }
        },
        PipelineDecision::Reject(rejection) => ApiError::from(rejection).into_response(),
        PipelineDecision::Drop => {
            // Recorded up front: a client giving up cancels the hold
            record(StatusCode::GATEWAY_TIMEOUT);
            return hold_connection(state.drop_hold).await;
        },
    };

    record(response.status());
    response
}

/// Write nothing for `hold`, then release the connection with an empty 504
///
/// A client that disconnects first cancels this future.
async fn hold_connection(hold: Duration) -> Response {
    debug!(hold_secs = hold.as_secs(), "Holding dropped request");
    tokio::time::sleep(hold).await;
    warn!("Dropped request hold elapsed, releasing connection");
    StatusCode::GATEWAY_TIMEOUT.into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn context_from_extensions() {
        let mut request = Request::builder()
            .method("POST")
            .uri("/orders/7?x=1")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(TenantContext(Some(TenantId::parse("t1").unwrap())));
        request
            .extensions_mut()
            .insert(RequestId("rid".to_string()));

        let ctx = request_context(&request);

        assert_eq!(ctx.method(), "POST");
        assert_eq!(ctx.path(), "/orders/7");
        assert_eq!(ctx.tenant().map(TenantId::as_str), Some("t1"));
        assert_eq!(ctx.request_id(), Some("rid"));
    }

    #[test]
    fn context_without_extensions() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let ctx = request_context(&request);
        assert!(ctx.tenant().is_none());
        assert!(ctx.request_id().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn hold_releases_with_empty_gateway_timeout() {
        let response = hold_connection(Duration::from_secs(300)).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = axum::body::to_bytes(response.into_body(), 16).await.unwrap();
        assert!(body.is_empty());
    }
}
