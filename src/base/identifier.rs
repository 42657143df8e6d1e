//! Validated tenant identifiers.

use crate::base::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};

/// A tenant slug matching `^[a-z0-9_-]+$`.
///
/// Identifiers are only constructed through validation, so holding one is
/// proof the grammar holds. Cloning is cheap (`Arc<str>`), which matters
/// because identifiers flow through the cache, diagnostics and the registry.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantIdentifier {
    slug: Arc<str>,
}

impl TenantIdentifier {
    /// Validates and wraps `value`.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ResolveError> {
        let value = value.as_ref();
        if is_valid_identifier(value) {
            Ok(Self {
                slug: Arc::from(value),
            })
        } else {
            Err(ResolveError::InvalidIdentifier {
                value: value.to_string(),
            })
        }
    }

    /// Validates `value`, returning `None` instead of an error.
    ///
    /// Strategies use this: a malformed candidate is "no match", not a failure.
    pub fn parse(value: &str) -> Option<Self> {
        Self::new(value).ok()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.slug
    }
}

/// Checks the identifier grammar without allocating.
pub fn is_valid_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

impl FromStr for TenantIdentifier {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TenantIdentifier {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TenantIdentifier {
    type Error = ResolveError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantIdentifier> for String {
    fn from(value: TenantIdentifier) -> Self {
        value.slug.to_string()
    }
}

impl AsRef<str> for TenantIdentifier {
    fn as_ref(&self) -> &str {
        &self.slug
    }
}

impl PartialEq<str> for TenantIdentifier {
    fn eq(&self, other: &str) -> bool {
        &*self.slug == other
    }
}

impl PartialEq<&str> for TenantIdentifier {
    fn eq(&self, other: &&str) -> bool {
        &*self.slug == *other
    }
}

impl fmt::Debug for TenantIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.slug, f)
    }
}

impl fmt::Display for TenantIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.slug, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for value in ["acme", "tenant-1", "shared_tenant", "0", "a-b_c-9"] {
            assert!(TenantIdentifier::new(value).is_ok(), "{value} should be valid");
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        for value in ["", "Acme", "acme corp", "acme.com", "tenant/1", "ténant", " acme"] {
            assert!(TenantIdentifier::parse(value).is_none(), "{value} should be invalid");
        }
    }

    #[test]
    fn test_invalid_identifier_error_carries_value() {
        let err = TenantIdentifier::new("Bad Slug").unwrap_err();
        match err {
            ResolveError::InvalidIdentifier { value } => assert_eq!(value, "Bad Slug"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_serde_validates() {
        let id: TenantIdentifier = serde_json::from_str("\"acme\"").unwrap();
        assert_eq!(id, "acme");
        assert!(serde_json::from_str::<TenantIdentifier>("\"ACME\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"acme\"");
    }
}
