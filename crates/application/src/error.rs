//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Shared counter store failed or is unreachable
    #[error("Counter store error: {0}")]
    CounterStore(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::CounterStore(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_store_error_is_retryable() {
        assert!(ApplicationError::CounterStore("timeout".to_string()).is_retryable());
    }

    #[test]
    fn configuration_error_is_not_retryable() {
        assert!(!ApplicationError::Configuration("bad".to_string()).is_retryable());
    }

    #[test]
    fn domain_error_is_transparent() {
        let err: ApplicationError = DomainError::InvalidRoutePrefix("x".to_string()).into();
        assert_eq!(err.to_string(), "Invalid route prefix: \"x\"");
    }
}
