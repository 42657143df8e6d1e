use super::subdomain::excluded_set;
use super::{
    ready, DomainMapping, PatternAction, ResolutionOutcome, Resolving, Strategy, SubdomainPattern,
    DEFAULT_EXCLUDED_SUBDOMAINS,
};
use crate::base::request::TenantRequest;
use std::collections::HashSet;

/// Exact domain mapping first, then wildcard subdomain patterns.
///
/// Patterns are tried in declaration order and the first one that captures
/// a label decides the outcome; later patterns are not consulted, even when
/// the captured label is excluded.
#[derive(Debug, Clone)]
pub struct HybridStrategy {
    domains: DomainMapping,
    patterns: Vec<SubdomainPattern>,
    excluded: HashSet<String>,
}

impl HybridStrategy {
    pub fn new(domains: DomainMapping, patterns: Vec<SubdomainPattern>) -> Self {
        Self {
            domains,
            patterns,
            excluded: excluded_set(DEFAULT_EXCLUDED_SUBDOMAINS),
        }
    }

    pub fn with_excluded<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded = excluded_set(labels);
        self
    }

    pub fn patterns(&self) -> &[SubdomainPattern] {
        &self.patterns
    }

    pub fn extract(&self, request: &TenantRequest) -> ResolutionOutcome {
        let host = request.host();
        if let Some(id) = self.domains.get(host) {
            return ResolutionOutcome::Resolved(id.clone());
        }

        let Some((pattern, label)) = self
            .patterns
            .iter()
            .find_map(|p| p.capture(host).map(|label| (p, label)))
        else {
            return ResolutionOutcome::NoMatch;
        };

        if self.excluded.contains(label) {
            tracing::debug!(
                host = %host,
                pattern = %pattern.pattern(),
                "captured label is excluded"
            );
            return ResolutionOutcome::NoMatch;
        }

        match pattern.action() {
            PatternAction::UseSubdomainAsSlug => ResolutionOutcome::from_candidate(Some(label)),
            PatternAction::Fixed(id) => ResolutionOutcome::Resolved(id.clone()),
        }
    }
}

impl Strategy for HybridStrategy {
    fn name(&self) -> &str {
        "hybrid"
    }

    fn resolve<'a>(&'a self, request: &'a TenantRequest) -> Resolving<'a> {
        ready(self.extract(request))
    }
}
