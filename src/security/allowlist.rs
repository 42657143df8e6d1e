//! Header allow-list.
//!
//! Headers are client-controlled. Only headers named here may influence
//! tenant resolution; a header strategy configured for any other header is
//! skipped on every request. An empty list permits nothing.

use crate::base::error::ResolveError;
use http::header::HeaderName;
use std::collections::HashSet;
use std::str::FromStr;

/// Headers permitted when no allow-list is configured.
pub const DEFAULT_ALLOWED_HEADERS: &[&str] = &["X-Tenant-Id", "X-Tenant-Slug"];

/// Case-insensitive set of header names trusted for resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderAllowList {
    names: HashSet<HeaderName>,
}

impl HeaderAllowList {
    /// Builds an allow-list, rejecting names that are not valid header names.
    pub fn new<I, S>(names: I) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref().trim();
                HeaderName::from_str(name).map_err(|_| ResolveError::InvalidHeader {
                    name: name.to_string(),
                })
            })
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(Self { names })
    }

    /// An allow-list that permits no header at all.
    pub fn deny_all() -> Self {
        Self::default()
    }

    pub fn permits(&self, name: &HeaderName) -> bool {
        self.names.contains(name)
    }

    /// Like [`permits`](Self::permits), for unparsed names. Invalid names are never permitted.
    pub fn permits_str(&self, name: &str) -> bool {
        HeaderName::from_str(name.trim())
            .map(|n| self.permits(&n))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Allow-listed names, lower-cased, in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(HeaderName::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<HeaderName> for HeaderAllowList {
    fn from_iter<T: IntoIterator<Item = HeaderName>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
