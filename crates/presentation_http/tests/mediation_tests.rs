//! Backend invocation guarantees, checked with a mocked backend
#![allow(clippy::expect_used)]

use std::{sync::Arc, time::Duration};

use application::{AdmissionConfig, DecisionSinkPort};
use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use axum_test::TestServer;
use domain::{FaultPolicy, Percentage};
use infrastructure::{InMemoryCounterStore, RecordingDecisionSink};
use mockall::mock;
use presentation_http::{ApiError, AppState, Backend, BackendHandle, assemble_state, create_router};

mock! {
    pub Upstream {}

    #[async_trait]
    impl Backend for Upstream {
        async fn forward(&self, request: Request) -> Result<Response, ApiError>;
    }
}

impl std::fmt::Debug for MockUpstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockUpstream").finish_non_exhaustive()
    }
}

fn server(backend: MockUpstream, limit: u32) -> (TestServer, AppState) {
    let handle: BackendHandle = Arc::new(backend);
    let sink: Arc<dyn DecisionSinkPort> = Arc::new(RecordingDecisionSink::new());
    let state = assemble_state(
        AdmissionConfig {
            limit,
            ..AdmissionConfig::default()
        },
        Duration::from_millis(10),
        Arc::new(InMemoryCounterStore::new()),
        sink,
        vec![("/users".to_string(), handle)],
    )
    .expect("state");
    let server = TestServer::new(create_router(state.clone())).expect("server");
    (server, state)
}

fn tenant() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-tenant-id"),
        HeaderValue::from_static("t1"),
    )
}

#[tokio::test]
async fn admitted_request_is_forwarded_exactly_once() {
    let mut backend = MockUpstream::new();
    backend
        .expect_forward()
        .withf(|request| request.uri().path() == "/users/9")
        .times(1)
        .returning(|_| Ok(StatusCode::ACCEPTED.into_response()));
    let (server, _) = server(backend, 5);
    let (name, value) = tenant();

    server
        .get("/users/9")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::ACCEPTED);
}

#[tokio::test]
async fn terminated_requests_never_reach_backend() {
    let mut backend = MockUpstream::new();
    backend.expect_forward().never();
    let (server, state) = server(backend, 1);

    // No tenant
    server
        .get("/users")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // Injected failure
    state
        .fault_injector
        .set(FaultPolicy::enabled().with_error_rate(Percentage::FULL));
    let (name, value) = tenant();
    server
        .get("/users")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);

    // Dropped
    state
        .fault_injector
        .set(FaultPolicy::enabled().with_drop_rate(Percentage::FULL));
    let (name, value) = tenant();
    server
        .get("/users")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn quota_denial_stops_before_backend() {
    let mut backend = MockUpstream::new();
    backend
        .expect_forward()
        .times(1)
        .returning(|_| Ok(StatusCode::OK.into_response()));
    let (server, _) = server(backend, 1);

    let (name, value) = tenant();
    server
        .get("/users")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();
    server
        .get("/users")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn backend_error_is_rendered() {
    let mut backend = MockUpstream::new();
    backend
        .expect_forward()
        .returning(|_| Err(ApiError::BadGateway("connection refused".to_string())));
    let (server, _) = server(backend, 5);
    let (name, value) = tenant();

    let response = server.get("/users").add_header(name, value).await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "bad_gateway");
}
