//! Backend forwarding
//!
//! A [`Backend`] receives the original request once every mediation stage
//! has let it through. [`ProxyBackend`] relays it over HTTP with `reqwest`.

use std::time::Duration;

use application::ApplicationError;
use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderName, header},
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::error::ApiError;

/// Headers that only describe a single hop and are never forwarded
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

/// Default upstream request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Capability that produces the response for an admitted request
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Handle the request
    async fn forward(&self, request: Request) -> Result<Response, ApiError>;
}

/// Reverse proxy to a single upstream base URL
#[derive(Debug, Clone)]
pub struct ProxyBackend {
    client: reqwest::Client,
    target: String,
    max_body_size: usize,
}

impl ProxyBackend {
    /// Create a proxy to `target` (e.g. `http://localhost:9001`)
    pub fn new(target: impl Into<String>, max_body_size: usize) -> Result<Self, ApplicationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ApplicationError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self::with_client(client, target, max_body_size))
    }

    /// Create a proxy using an existing client
    pub fn with_client(
        client: reqwest::Client,
        target: impl Into<String>,
        max_body_size: usize,
    ) -> Self {
        Self {
            client,
            target: target.into().trim_end_matches('/').to_string(),
            max_body_size,
        }
    }

    /// Upstream base URL
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Full upstream URL for a path and optional query
    pub fn upstream_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.target, path_and_query)
    }
}

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in &HOP_BY_HOP {
        forwarded.remove(name);
    }
    forwarded
}

#[async_trait]
impl Backend for ProxyBackend {
    #[instrument(skip(self, request), fields(target = %self.target), level = "debug")]
    async fn forward(&self, request: Request) -> Result<Response, ApiError> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
        let url = self.upstream_url(&path_and_query);

        let body = to_bytes(body, self.max_body_size)
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read request body: {e}")))?;

        debug!(method = %parts.method, url = %url, "Forwarding request");

        let upstream = self
            .client
            .request(parts.method, &url)
            .headers(strip_hop_by_hop(&parts.headers))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Upstream request failed");
                ApiError::BadGateway(e.to_string())
            })?;

        let status = upstream.status();
        let headers = strip_hop_by_hop(upstream.headers());
        let bytes = upstream.bytes().await.map_err(|e| {
            warn!(url = %url, error = %e, "Failed to read upstream body");
            ApiError::BadGateway(e.to_string())
        })?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_trailing_slash_is_trimmed() {
        let backend = ProxyBackend::with_client(reqwest::Client::new(), "http://h:1/", 1024);
        assert_eq!(backend.target(), "http://h:1");
        assert_eq!(backend.upstream_url("/users?x=1"), "http://h:1/users?x=1");
    }

    #[test]
    fn strips_hop_by_hop_and_host() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "gateway".parse().unwrap());
        headers.insert(header::CONNECTION, "keep-alive".parse().unwrap());
        headers.insert("x-tenant-id", "t1".parse().unwrap());

        let forwarded = strip_hop_by_hop(&headers);

        assert!(forwarded.get(header::HOST).is_none());
        assert!(forwarded.get(header::CONNECTION).is_none());
        assert_eq!(forwarded["x-tenant-id"], "t1");
    }
}
