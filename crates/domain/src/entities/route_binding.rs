//! Route binding entity - A path prefix bound to a handler

use crate::DomainError;

/// An ordered pair of path prefix and handler
///
/// Bindings are matched with plain `starts_with`, so `/a` also covers
/// `/ab`. Ordering between bindings is decided by whoever holds the
/// collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding<H> {
    prefix: String,
    handler: H,
}

impl<H> RouteBinding<H> {
    /// Create a binding; the prefix must start with `/`
    ///
    /// # Examples
    ///
    /// ```
    /// use domain::RouteBinding;
    ///
    /// let binding = RouteBinding::new("/users", "users-backend").unwrap();
    /// assert!(binding.matches("/users/42"));
    /// assert!(RouteBinding::new("users", ()).is_err());
    /// ```
    pub fn new(prefix: impl Into<String>, handler: H) -> Result<Self, DomainError> {
        let prefix = prefix.into();
        if !prefix.starts_with('/') {
            return Err(DomainError::InvalidRoutePrefix(prefix));
        }
        Ok(Self { prefix, handler })
    }

    /// The bound prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The bound handler
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Whether `path` falls under this binding
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}
