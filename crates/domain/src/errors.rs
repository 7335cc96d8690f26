//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Tenant identifier was empty or whitespace-only
    #[error("Invalid tenant id: {0:?}")]
    InvalidTenantId(String),

    /// Route prefix did not start with `/`
    #[error("Invalid route prefix: {0:?}")]
    InvalidRoutePrefix(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_tenant_id_message() {
        let err = DomainError::InvalidTenantId("  ".to_string());
        assert_eq!(err.to_string(), "Invalid tenant id: \"  \"");
    }

    #[test]
    fn invalid_route_prefix_message() {
        let err = DomainError::InvalidRoutePrefix("users".to_string());
        assert_eq!(err.to_string(), "Invalid route prefix: \"users\"");
    }

    #[test]
    fn validation_error_message() {
        let err = DomainError::ValidationError("field is required".to_string());
        assert_eq!(err.to_string(), "Validation failed: field is required");
    }
}
