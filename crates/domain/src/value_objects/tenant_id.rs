//! Tenant identifier value object
//!
//! # Examples
//!
//! ```
//! use domain::TenantId;
//!
//! let tenant_id = TenantId::parse("t1").unwrap();
//! assert_eq!(tenant_id.as_str(), "t1");
//!
//! // Blank identifiers are not tenants
//! assert!(TenantId::parse("   ").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// An opaque tenant identifier
///
/// Tenants are resolved by an upstream collaborator and attached to the
/// request before mediation runs. The gateway never interprets the value,
/// it only requires it to be non-blank so that "no tenant" stays a distinct
/// condition rather than an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Parse a tenant ID from a string, trimming surrounding whitespace
    ///
    /// # Examples
    ///
    /// ```
    /// use domain::TenantId;
    ///
    /// assert_eq!(TenantId::parse(" acme ").unwrap().as_str(), "acme");
    /// assert!(TenantId::parse("").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidTenantId(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TenantId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_opaque_value() {
        let id = TenantId::parse("tenant-42:eu").unwrap();
        assert_eq!(id.as_str(), "tenant-42:eu");
    }

    #[test]
    fn parse_trims_whitespace() {
        let id = TenantId::parse("  t1\t").unwrap();
        assert_eq!(id.as_str(), "t1");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(
            TenantId::parse(""),
            Err(DomainError::InvalidTenantId(_))
        ));
    }

    #[test]
    fn parse_rejects_whitespace_only() {
        assert!(TenantId::parse("   ").is_err());
    }

    #[test]
    fn display_matches_inner_value() {
        let id = TenantId::parse("acme").unwrap();
        assert_eq!(format!("{id}"), "acme");
    }

    #[test]
    fn serialization_is_plain_string() {
        let id = TenantId::parse("acme").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"acme\"");
        let back: TenantId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn deserialization_rejects_blank() {
        let result: Result<TenantId, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }
}
