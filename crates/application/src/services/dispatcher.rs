//! Dispatcher - Ordered path-prefix routing
//!
//! Bindings are fixed at construction and scanned in registration order;
//! the first prefix the path starts with wins, even when a later binding
//! would match more specifically.

use std::sync::Arc;

use domain::{DecisionKind, DomainError, RouteBinding};
use tracing::debug;

use crate::ports::DecisionSinkPort;
use crate::request_context::RequestContext;

/// Ordered table of prefix bindings
#[derive(Debug)]
pub struct Dispatcher<H> {
    bindings: Vec<RouteBinding<H>>,
    sink: Arc<dyn DecisionSinkPort>,
}

impl<H> Dispatcher<H> {
    /// Create an empty dispatcher
    pub fn new(sink: Arc<dyn DecisionSinkPort>) -> Self {
        Self {
            bindings: Vec::new(),
            sink,
        }
    }

    /// Append a binding; duplicates are kept and never reordered
    pub fn bind(&mut self, prefix: impl Into<String>, handler: H) -> Result<(), DomainError> {
        self.bindings.push(RouteBinding::new(prefix, handler)?);
        Ok(())
    }

    /// Builder form of [`Dispatcher::bind`]
    pub fn with_route(mut self, prefix: impl Into<String>, handler: H) -> Result<Self, DomainError> {
        self.bind(prefix, handler)?;
        Ok(self)
    }

    /// First binding matching `path`, without emitting events
    pub fn lookup(&self, path: &str) -> Option<&RouteBinding<H>> {
        self.bindings.iter().find(|binding| binding.matches(path))
    }

    /// Route a request, emitting a `route` or `block` decision event
    pub fn route(&self, ctx: &RequestContext) -> Option<&RouteBinding<H>> {
        if let Some(binding) = self.lookup(ctx.path()) {
            debug!(path = %ctx.path(), prefix = %binding.prefix(), "Route matched");
            self.sink.emit(
                ctx.event(DecisionKind::Route, "routing to backend")
                    .with_target(binding.prefix()),
            );
            Some(binding)
        } else {
            debug!(path = %ctx.path(), "No route matched");
            self.sink.emit(ctx.event(DecisionKind::Block, "route not found"));
            None
        }
    }

    /// Bindings in registration order
    pub fn bindings(&self) -> &[RouteBinding<H>] {
        &self.bindings
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no bindings are registered
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
