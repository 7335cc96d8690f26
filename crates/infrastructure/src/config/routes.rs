//! Backend route table.

use serde::{Deserialize, Serialize};

/// One prefix-to-backend binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Path prefix, starting with `/`
    pub prefix: String,
    /// Backend base URL the request path is appended to
    pub target: String,
}

impl RouteConfig {
    /// Create a route entry
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
        }
    }
}

/// Built-in routes used when none are configured
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/users", "http://localhost:9001"),
        RouteConfig::new("/orders", "http://localhost:9002"),
    ]
}
