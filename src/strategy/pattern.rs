//! Wildcard subdomain patterns (`*.myplatform.com`).
//!
//! A pattern matches exactly one label in place of `*`:
//! `beta.myplatform.com` matches, `a.beta.myplatform.com` does not.

use crate::base::error::ResolveError;
use crate::base::identifier::TenantIdentifier;
use crate::base::request::normalize_host;

/// What a matching pattern resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternAction {
    /// The captured label is the tenant identifier.
    UseSubdomainAsSlug,
    /// Every matching host belongs to one fixed tenant.
    Fixed(TenantIdentifier),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainPattern {
    pattern: String,
    suffix: String,
    action: PatternAction,
}

impl SubdomainPattern {
    pub fn new(pattern: &str, action: PatternAction) -> Result<Self, ResolveError> {
        let normalized = pattern.trim().to_ascii_lowercase();
        let suffix = normalized
            .strip_prefix("*.")
            .ok_or_else(|| ResolveError::invalid_pattern(pattern, "must start with \"*.\""))?;

        if suffix.is_empty() {
            return Err(ResolveError::invalid_pattern(pattern, "empty domain suffix"));
        }
        if suffix.contains('*') {
            return Err(ResolveError::invalid_pattern(
                pattern,
                "only a single leading wildcard is supported",
            ));
        }
        if suffix.split('.').any(str::is_empty) {
            return Err(ResolveError::invalid_pattern(pattern, "empty label in suffix"));
        }
        if normalize_host(suffix) != suffix {
            return Err(ResolveError::invalid_pattern(
                pattern,
                "suffix must be a bare host without port",
            ));
        }

        Ok(Self {
            suffix: suffix.to_string(),
            pattern: normalized,
            action,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn action(&self) -> &PatternAction {
        &self.action
    }

    /// Returns the wildcard label if `host` (normalized) matches.
    pub fn capture<'h>(&self, host: &'h str) -> Option<&'h str> {
        let label = host
            .strip_suffix(self.suffix.as_str())?
            .strip_suffix('.')?;
        (!label.is_empty() && !label.contains('.')).then_some(label)
    }
}
