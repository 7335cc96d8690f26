//! Decision event entity - Immutable record of one gate's outcome for one request

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of decision a pipeline stage made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Request admitted by the quota gate
    Admit,
    /// Request terminated by a gate (quota, tenant, routing)
    Block,
    /// Request matched a route binding
    Route,
    /// Fault injection stage evaluated the request
    Chaos,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Admit => "admit",
            Self::Block => "block",
            Self::Route => "route",
            Self::Chaos => "chaos",
        };
        f.write_str(s)
    }
}

/// Decision event emitted once per decision point per request
///
/// Events are built once and never mutated after emission. The `extra` map
/// carries decision-specific context such as `delay_ms` or `limit`/`used`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEvent {
    /// When the decision was taken
    pub timestamp: DateTime<Utc>,
    /// Kind of decision
    pub decision: DecisionKind,
    /// Free-text reason
    pub reason: String,
    /// Tenant the request is attributed to, when one was resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Request path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Matched route prefix, for routing decisions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// HTTP method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Request identifier propagated from the inbound header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Decision-specific fields
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl DecisionEvent {
    /// Create a new event stamped with the current time
    pub fn new(decision: DecisionKind, reason: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            decision,
            reason: reason.into(),
            tenant: None,
            route: None,
            target: None,
            method: None,
            request_id: None,
            extra: Map::new(),
        }
    }

    /// Set the tenant
    #[must_use]
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Set the request path
    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Set the matched target
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the HTTP method
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Set the request identifier
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Add a decision-specific field
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Look up a decision-specific field
    pub fn extra_field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
