//! Tenant resolution strategies.
//!
//! Each strategy is one self-contained heuristic for pulling a tenant
//! identifier out of a request. All of them implement [`Strategy`]; only
//! [`DnsTxtStrategy`] performs I/O; the rest finish synchronously and
//! return an already-completed future.
//!
//! A strategy never fails for "not found". It yields one
//! [`ResolutionOutcome`] per invocation:
//!
//! - [`ResolutionOutcome::Resolved`]: a validated identifier
//! - [`ResolutionOutcome::NoMatch`]: the request carries no tenant for this strategy
//! - [`ResolutionOutcome::Skipped`]: the strategy refused to look (e.g. header not allow-listed)
//! - [`ResolutionOutcome::Failed`]: a transport-level failure (DNS timeout, SERVFAIL)

mod dnstxt;
mod domain;
mod header;
mod hybrid;
mod path;
pub mod pattern;
mod query;
mod subdomain;

pub use dnstxt::DnsTxtStrategy;
pub use domain::{DomainMapping, DomainStrategy};
pub use header::HeaderStrategy;
pub use hybrid::HybridStrategy;
pub use path::{PathStrategy, SegmentPosition};
pub use pattern::{PatternAction, SubdomainPattern};
pub use query::QueryStrategy;
pub use subdomain::SubdomainStrategy;

use crate::base::error::ResolveError;
use crate::base::identifier::TenantIdentifier;
use crate::base::request::TenantRequest;
use serde::Serialize;
use std::{fmt, future::Future, pin::Pin, str::FromStr, sync::Arc};

/// Subdomain labels that never name a tenant unless configured otherwise.
pub const DEFAULT_EXCLUDED_SUBDOMAINS: &[&str] = &["www", "api", "admin", "mail"];

/// Result of one strategy invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Resolved(TenantIdentifier),
    NoMatch,
    Skipped(SkipReason),
    Failed(StrategyFailure),
}

impl ResolutionOutcome {
    /// Validates a raw candidate; anything outside the grammar is `NoMatch`.
    pub fn from_candidate(candidate: Option<&str>) -> Self {
        candidate
            .and_then(TenantIdentifier::parse)
            .map(ResolutionOutcome::Resolved)
            .unwrap_or(ResolutionOutcome::NoMatch)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionOutcome::Resolved(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ResolutionOutcome::Failed(_))
    }

    pub fn identifier(&self) -> Option<&TenantIdentifier> {
        match self {
            ResolutionOutcome::Resolved(id) => Some(id),
            _ => None,
        }
    }

    /// Short label used in rendered diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionOutcome::Resolved(_) => "resolved",
            ResolutionOutcome::NoMatch => "no match",
            ResolutionOutcome::Skipped(_) => "skipped",
            ResolutionOutcome::Failed(_) => "error",
        }
    }
}

/// Why a strategy declined to inspect the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The configured header is not in the header allow-list.
    HeaderNotAllowListed { header: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::HeaderNotAllowListed { header } => {
                write!(f, "header {header} is not allow-listed")
            }
        }
    }
}

/// A strategy-level failure. Always recovered by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyFailure {
    Timeout { query: String, timeout_ms: u64 },
    Transport { query: String, message: String },
    Misconfigured { message: String },
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyFailure::Timeout { query, timeout_ms } => {
                write!(f, "lookup of {query} timed out after {timeout_ms}ms")
            }
            StrategyFailure::Transport { query, message } => {
                write!(f, "lookup of {query} failed: {message}")
            }
            StrategyFailure::Misconfigured { message } => write!(f, "misconfigured: {message}"),
        }
    }
}

/// Alias for the future returned by [`Strategy::resolve`].
pub type Resolving<'a> = Pin<Box<dyn Future<Output = ResolutionOutcome> + Send + 'a>>;

/// Wraps a synchronously computed outcome.
pub(crate) fn ready<'a>(outcome: ResolutionOutcome) -> Resolving<'a> {
    Box::pin(std::future::ready(outcome))
}

/// A tenant resolution strategy.
///
/// Implementations must be thread-safe and must not mutate request data.
/// The returned future should complete in bounded time; I/O-bound
/// strategies enforce their own timeout.
pub trait Strategy: Send + Sync {
    /// Name recorded in diagnostics.
    fn name(&self) -> &str;

    fn resolve<'a>(&'a self, request: &'a TenantRequest) -> Resolving<'a>;
}

impl<S: Strategy + ?Sized> Strategy for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn resolve<'a>(&'a self, request: &'a TenantRequest) -> Resolving<'a> {
        (**self).resolve(request)
    }
}

/// Built-in strategy variants, as named in `resolver_chain.order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Subdomain,
    Path,
    Header,
    Query,
    Domain,
    Hybrid,
    DnsTxt,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::Subdomain,
        StrategyKind::Path,
        StrategyKind::Header,
        StrategyKind::Query,
        StrategyKind::Domain,
        StrategyKind::Hybrid,
        StrategyKind::DnsTxt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Subdomain => "subdomain",
            StrategyKind::Path => "path",
            StrategyKind::Header => "header",
            StrategyKind::Query => "query",
            StrategyKind::Domain => "domain",
            StrategyKind::Hybrid => "hybrid",
            StrategyKind::DnsTxt => "dns_txt",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ResolveError::UnknownStrategy {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
