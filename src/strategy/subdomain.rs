use super::{ready, ResolutionOutcome, Resolving, Strategy, DEFAULT_EXCLUDED_SUBDOMAINS};
use crate::base::request::{normalize_host, TenantRequest};
use std::collections::HashSet;

/// Resolves `<tenant>.<base_domain>` hosts.
///
/// Exactly one label may precede the base domain: `acme.example.com`
/// matches, `eu.acme.example.com` and `example.com` do not.
#[derive(Debug, Clone)]
pub struct SubdomainStrategy {
    base_domain: String,
    excluded: HashSet<String>,
}

impl SubdomainStrategy {
    /// Creates a strategy for `base_domain` with the default exclusions.
    pub fn new(base_domain: &str) -> Self {
        Self {
            base_domain: normalize_host(base_domain),
            excluded: excluded_set(DEFAULT_EXCLUDED_SUBDOMAINS),
        }
    }

    /// Replaces the excluded label set.
    pub fn with_excluded<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded = excluded_set(labels);
        self
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn extract(&self, request: &TenantRequest) -> ResolutionOutcome {
        self.extract_host(request.host())
    }

    pub fn extract_host(&self, host: &str) -> ResolutionOutcome {
        let host = normalize_host(host);
        let label = host
            .strip_suffix(self.base_domain.as_str())
            .and_then(|prefix| prefix.strip_suffix('.'));

        match label {
            Some(label) if !label.contains('.') && !self.excluded.contains(label) => {
                ResolutionOutcome::from_candidate(Some(label))
            }
            _ => ResolutionOutcome::NoMatch,
        }
    }
}

impl Strategy for SubdomainStrategy {
    fn name(&self) -> &str {
        "subdomain"
    }

    fn resolve<'a>(&'a self, request: &'a TenantRequest) -> Resolving<'a> {
        ready(self.extract(request))
    }
}

pub(crate) fn excluded_set<I, S>(labels: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .map(|l| l.as_ref().trim().to_ascii_lowercase())
        .filter(|l| !l.is_empty())
        .collect()
}
