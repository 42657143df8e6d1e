use super::{ready, ResolutionOutcome, Resolving, Strategy};
use crate::base::error::ResolveError;
use crate::base::identifier::TenantIdentifier;
use crate::base::request::{normalize_host, TenantRequest};
use std::collections::HashMap;

/// Exact host → tenant map. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct DomainMapping {
    entries: HashMap<String, TenantIdentifier>,
}

impl DomainMapping {
    /// Builds a mapping; hosts are normalized, identifiers validated.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries = HashMap::new();
        for (host, tenant) in pairs {
            let host = normalize_host(host.as_ref());
            if host.is_empty() {
                return Err(ResolveError::invalid_config("domain mapping has an empty host"));
            }
            let tenant = TenantIdentifier::new(tenant)?;
            if let Some(previous) = entries.insert(host.clone(), tenant) {
                return Err(ResolveError::invalid_config(format!(
                    "host {host} is mapped more than once (previously to {previous})"
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Looks up an already-normalized host.
    pub fn get(&self, host: &str) -> Option<&TenantIdentifier> {
        self.entries.get(host)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves custom domains (`client-a.com` → `client-a`).
#[derive(Debug, Clone)]
pub struct DomainStrategy {
    mapping: DomainMapping,
}

impl DomainStrategy {
    pub fn new(mapping: DomainMapping) -> Self {
        Self { mapping }
    }

    pub fn extract(&self, request: &TenantRequest) -> ResolutionOutcome {
        match self.mapping.get(request.host()) {
            Some(id) => ResolutionOutcome::Resolved(id.clone()),
            None => ResolutionOutcome::NoMatch,
        }
    }
}

impl Strategy for DomainStrategy {
    fn name(&self) -> &str {
        "domain"
    }

    fn resolve<'a>(&'a self, request: &'a TenantRequest) -> Resolving<'a> {
        ready(self.extract(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> DomainMapping {
        DomainMapping::from_pairs([("client-a.com", "client-a"), ("Shop.Client-B.io", "client-b")])
            .unwrap()
    }

    #[test]
    fn test_exact_match() {
        let s = DomainStrategy::new(mapping());
        let req = TenantRequest::new("client-a.com:443");
        assert_eq!(s.extract(&req).identifier().unwrap(), "client-a");

        let req = TenantRequest::new("shop.client-b.io");
        assert_eq!(s.extract(&req).identifier().unwrap(), "client-b");
    }

    #[test]
    fn test_no_suffix_matching() {
        let s = DomainStrategy::new(mapping());
        let req = TenantRequest::new("www.client-a.com");
        assert_eq!(s.extract(&req), ResolutionOutcome::NoMatch);
    }

    #[test]
    fn test_invalid_entries_rejected() {
        assert!(DomainMapping::from_pairs([("a.com", "Not Valid")]).is_err());
        assert!(DomainMapping::from_pairs([("", "acme")]).is_err());
        assert!(DomainMapping::from_pairs([("a.com", "x"), ("A.com", "y")]).is_err());
    }
}
