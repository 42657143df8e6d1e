//! Resolver chain configuration.
//!
//! Mirrors the `resolver_chain` configuration block:
//!
//! ```json
//! {
//!   "order": ["header", "hybrid", "dns_txt"],
//!   "strict": true,
//!   "header_allow_list": ["X-Tenant-Id"],
//!   "hybrid": {
//!     "domains": { "client-a.com": "client-a" },
//!     "subdomain_patterns": [
//!       { "pattern": "*.myplatform.com", "strategy": "use_subdomain_as_slug" },
//!       { "pattern": "*.shared.net", "strategy": "fixed", "tenant": "shared_tenant" }
//!     ]
//!   },
//!   "dns_txt": { "timeout_secs": 5, "enable_cache": true, "cache_ttl_secs": 300 }
//! }
//! ```
//!
//! Every section has defaults, so a config only names what it changes.
//! Loading does not validate; [`ChainConfig::validate`] and building a
//! resolver do.

use crate::base::error::ResolveError;
use crate::base::identifier::TenantIdentifier;
use crate::dns::{DnsCache, TxtLookup};
use crate::security::{HeaderAllowList, DEFAULT_ALLOWED_HEADERS};
use crate::strategy::{
    DnsTxtStrategy, DomainMapping, DomainStrategy, HeaderStrategy, HybridStrategy, PathStrategy,
    PatternAction, QueryStrategy, SegmentPosition, StrategyKind, SubdomainPattern,
    SubdomainStrategy, DEFAULT_EXCLUDED_SUBDOMAINS,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Allowed DNS lookup timeout range, in seconds.
pub const DNS_TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=30;

/// Upper bound for both DNS cache TTLs, in seconds (one week).
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Strategy names, in evaluation order.
    pub order: Vec<String>,
    /// Require agreement between all resolving strategies.
    pub strict: bool,
    pub header_allow_list: Vec<String>,
    pub subdomain: SubdomainConfig,
    pub path: PathConfig,
    pub header: HeaderConfig,
    pub query: QueryConfig,
    pub domain: DomainConfig,
    pub hybrid: HybridConfig,
    pub dns_txt: DnsTxtConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            order: vec!["header".to_string(), "subdomain".to_string()],
            strict: false,
            header_allow_list: DEFAULT_ALLOWED_HEADERS.iter().map(|h| h.to_string()).collect(),
            subdomain: SubdomainConfig::default(),
            path: PathConfig::default(),
            header: HeaderConfig::default(),
            query: QueryConfig::default(),
            domain: DomainConfig::default(),
            hybrid: HybridConfig::default(),
            dns_txt: DnsTxtConfig::default(),
        }
    }
}

impl ChainConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ResolveError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ResolveError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Parses `order`, rejecting unknown, duplicate or missing entries.
    pub fn strategy_kinds(&self) -> Result<Vec<StrategyKind>, ResolveError> {
        if self.order.is_empty() {
            return Err(ResolveError::invalid_config("resolver chain order is empty"));
        }

        let mut seen = HashSet::new();
        self.order
            .iter()
            .map(|name| {
                let kind: StrategyKind = name.parse()?;
                if !seen.insert(kind) {
                    return Err(ResolveError::invalid_config(format!(
                        "strategy {kind} appears more than once in the chain order"
                    )));
                }
                Ok(kind)
            })
            .collect()
    }

    pub fn allow_list(&self) -> Result<HeaderAllowList, ResolveError> {
        HeaderAllowList::new(&self.header_allow_list)
    }

    /// Checks everything a resolver build would check, without building one.
    pub fn validate(&self) -> Result<(), ResolveError> {
        let allow_list = self.allow_list()?;
        for kind in self.strategy_kinds()? {
            match kind {
                StrategyKind::Subdomain => self.subdomain.build().map(drop)?,
                StrategyKind::Path => self.path.build().map(drop)?,
                StrategyKind::Header => self.header.build(&allow_list).map(drop)?,
                StrategyKind::Query => self.query.build().map(drop)?,
                StrategyKind::Domain => self.domain.build().map(drop)?,
                StrategyKind::Hybrid => self.hybrid.build().map(drop)?,
                StrategyKind::DnsTxt => self.dns_txt.validate()?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdomainConfig {
    pub base_domain: Option<String>,
    pub excluded_subdomains: Vec<String>,
}

impl Default for SubdomainConfig {
    fn default() -> Self {
        Self {
            base_domain: None,
            excluded_subdomains: default_excluded_subdomains(),
        }
    }
}

impl SubdomainConfig {
    pub fn build(&self) -> Result<SubdomainStrategy, ResolveError> {
        let base_domain = self
            .base_domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| {
                ResolveError::invalid_config("subdomain strategy requires subdomain.base_domain")
            })?;
        Ok(SubdomainStrategy::new(base_domain).with_excluded(&self.excluded_subdomains))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Segment index; `None` takes the first non-empty segment.
    pub position: Option<usize>,
    pub one_based: bool,
    pub excluded_segments: Vec<String>,
}

impl PathConfig {
    pub fn build(&self) -> Result<PathStrategy, ResolveError> {
        let position = SegmentPosition::from_config(self.position, self.one_based)?;
        Ok(PathStrategy::new(position).with_excluded(&self.excluded_segments))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub name: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            name: "X-Tenant-Id".to_string(),
        }
    }
}

impl HeaderConfig {
    pub fn build(&self, allow_list: &HeaderAllowList) -> Result<HeaderStrategy, ResolveError> {
        HeaderStrategy::new(&self.name, allow_list)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub parameter: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            parameter: "tenant".to_string(),
        }
    }
}

impl QueryConfig {
    pub fn build(&self) -> Result<QueryStrategy, ResolveError> {
        let parameter = self.parameter.trim();
        if parameter.is_empty() {
            return Err(ResolveError::invalid_config("query.parameter is empty"));
        }
        Ok(QueryStrategy::new(parameter))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    /// Exact host → tenant identifier.
    pub domains: BTreeMap<String, String>,
}

impl DomainConfig {
    pub fn build(&self) -> Result<DomainStrategy, ResolveError> {
        Ok(DomainStrategy::new(DomainMapping::from_pairs(&self.domains)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStrategy {
    UseSubdomainAsSlug,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainPatternConfig {
    pub pattern: String,
    pub strategy: PatternStrategy,
    /// Required for `fixed`, ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl SubdomainPatternConfig {
    pub fn build(&self) -> Result<SubdomainPattern, ResolveError> {
        let action = match self.strategy {
            PatternStrategy::UseSubdomainAsSlug => PatternAction::UseSubdomainAsSlug,
            PatternStrategy::Fixed => {
                let tenant = self.tenant.as_deref().ok_or_else(|| {
                    ResolveError::invalid_pattern(&self.pattern, "fixed strategy requires a tenant")
                })?;
                PatternAction::Fixed(TenantIdentifier::new(tenant)?)
            }
        };
        SubdomainPattern::new(&self.pattern, action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub domains: BTreeMap<String, String>,
    /// Tried in declaration order.
    pub subdomain_patterns: Vec<SubdomainPatternConfig>,
    pub excluded_subdomains: Vec<String>,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            domains: BTreeMap::new(),
            subdomain_patterns: Vec::new(),
            excluded_subdomains: default_excluded_subdomains(),
        }
    }
}

impl HybridConfig {
    pub fn build(&self) -> Result<HybridStrategy, ResolveError> {
        let domains = DomainMapping::from_pairs(&self.domains)?;
        let patterns = self
            .subdomain_patterns
            .iter()
            .map(SubdomainPatternConfig::build)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HybridStrategy::new(domains, patterns).with_excluded(&self.excluded_subdomains))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsTxtConfig {
    pub timeout_secs: u64,
    pub enable_cache: bool,
    pub cache_ttl_secs: u64,
    /// TTL for cached "no record" answers; defaults to `cache_ttl_secs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_cache_ttl_secs: Option<u64>,
}

impl Default for DnsTxtConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            enable_cache: true,
            cache_ttl_secs: 300,
            negative_cache_ttl_secs: None,
        }
    }
}

impl DnsTxtConfig {
    pub fn validate(&self) -> Result<(), ResolveError> {
        if !DNS_TIMEOUT_RANGE_SECS.contains(&self.timeout_secs) {
            return Err(ResolveError::invalid_config(format!(
                "dns_txt.timeout_secs must be between {} and {}, got {}",
                DNS_TIMEOUT_RANGE_SECS.start(),
                DNS_TIMEOUT_RANGE_SECS.end(),
                self.timeout_secs
            )));
        }
        if self.enable_cache && self.cache_ttl_secs == 0 {
            return Err(ResolveError::invalid_config(
                "dns_txt.cache_ttl_secs must be positive when caching is enabled",
            ));
        }
        let ttls = [
            ("cache_ttl_secs", Some(self.cache_ttl_secs)),
            ("negative_cache_ttl_secs", self.negative_cache_ttl_secs),
        ];
        for (key, secs) in ttls {
            if let Some(secs) = secs.filter(|s| *s > MAX_CACHE_TTL_SECS) {
                return Err(ResolveError::invalid_config(format!(
                    "dns_txt.{key} must be at most {MAX_CACHE_TTL_SECS}, got {secs}"
                )));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// A fresh cache with this section's policy.
    pub fn build_cache(&self) -> DnsCache {
        if !self.enable_cache {
            return DnsCache::disabled();
        }
        let ttl = Duration::from_secs(self.cache_ttl_secs);
        let negative_ttl = self
            .negative_cache_ttl_secs
            .map(Duration::from_secs)
            .unwrap_or(ttl);
        DnsCache::new(ttl).with_negative_ttl(negative_ttl)
    }

    pub fn build(
        &self,
        lookup: Arc<dyn TxtLookup>,
        cache: DnsCache,
    ) -> Result<DnsTxtStrategy, ResolveError> {
        self.validate()?;
        Ok(DnsTxtStrategy::new(lookup, cache, self.timeout()))
    }
}

fn default_excluded_subdomains() -> Vec<String> {
    DEFAULT_EXCLUDED_SUBDOMAINS
        .iter()
        .map(|s| s.to_string())
        .collect()
}
