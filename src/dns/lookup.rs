//! Core TXT lookup types and traits.
//!
//! The DNS-TXT strategy never talks to a resolver library directly; it goes
//! through [`TxtLookup`], so the system resolver, static overrides and test
//! doubles are interchangeable.

use crate::base::request::normalize_host;
use std::{
    borrow::Cow, collections::HashMap, fmt, future::Future, net::IpAddr, pin::Pin, sync::Arc,
    time::Duration,
};
use thiserror::Error;

/// Label prepended to a host to form its tenant TXT query name.
pub const TXT_RECORD_PREFIX: &str = "_tenant";

/// A TXT query name, lower-cased and without a trailing dot.
///
/// DNS names compare case-insensitively, so two spellings of one name are
/// the same cache key and the same override entry.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Name(Box<str>);

impl Name {
    pub fn new(name: &str) -> Self {
        Self(name.trim().trim_end_matches('.').to_ascii_lowercase().into())
    }

    /// The `_tenant.<host>` record name for a request host.
    ///
    /// `None` for empty hosts and IP literals, which have no TXT records
    /// to consult.
    pub fn tenant_record(host: &str) -> Option<Self> {
        let host = normalize_host(host);
        if host.is_empty() || host.parse::<IpAddr>().is_ok() {
            return None;
        }
        Some(Self(format!("{TXT_RECORD_PREFIX}.{host}").into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport-level lookup failure.
///
/// "No such name" and "no TXT records" are not errors: lookups return an
/// empty record list for those.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxtLookupError {
    #[error("DNS lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("DNS transport failure: {0}")]
    Transport(String),
}

/// TXT record strings in answer order. Multi-chunk records are concatenated.
pub type TxtRecords = Vec<String>;

/// Alias for the `Future` type returned by a TXT lookup.
pub type TxtLookupFuture = Pin<Box<dyn Future<Output = Result<TxtRecords, TxtLookupError>> + Send>>;

/// Trait for TXT record lookups.
///
/// Implementations must be thread-safe; lookups take `&self` so many
/// requests can query concurrently.
pub trait TxtLookup: Send + Sync {
    fn lookup_txt(&self, name: Name) -> TxtLookupFuture;
}

/// Blanket implementation for Arc-wrapped lookups.
impl<L: TxtLookup + ?Sized> TxtLookup for Arc<L> {
    fn lookup_txt(&self, name: Name) -> TxtLookupFuture {
        (**self).lookup_txt(name)
    }
}

/// TXT lookup wrapper that answers some names from a static table.
///
/// Useful for local development, where `_tenant.acme.localhost` has no
/// real DNS, and for tests.
///
/// # Example
///
/// ```rust,ignore
/// use tenantchain::dns::{HickoryTxtLookup, TxtLookupWithOverrides};
/// use std::collections::HashMap;
///
/// let mut overrides = HashMap::new();
/// overrides.insert("_tenant.acme.localhost".into(), vec!["acme".to_string()]);
///
/// let lookup = TxtLookupWithOverrides::new(Arc::new(HickoryTxtLookup::default()), overrides);
/// ```
pub struct TxtLookupWithOverrides {
    inner: Arc<dyn TxtLookup>,
    overrides: Arc<HashMap<Cow<'static, str>, TxtRecords>>,
}

impl TxtLookupWithOverrides {
    pub fn new(
        inner: Arc<dyn TxtLookup>,
        overrides: HashMap<Cow<'static, str>, TxtRecords>,
    ) -> Self {
        let overrides = overrides
            .into_iter()
            .map(|(name, records)| (Cow::Owned(name.to_ascii_lowercase()), records))
            .collect();
        Self {
            inner,
            overrides: Arc::new(overrides),
        }
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl TxtLookup for TxtLookupWithOverrides {
    fn lookup_txt(&self, name: Name) -> TxtLookupFuture {
        if let Some(records) = self.overrides.get(name.as_str()) {
            let records = records.clone();
            return Box::pin(std::future::ready(Ok(records)));
        }
        self.inner.lookup_txt(name)
    }
}

impl fmt::Debug for TxtLookupWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxtLookupWithOverrides")
            .field("override_count", &self.overrides.len())
            .finish_non_exhaustive()
    }
}
