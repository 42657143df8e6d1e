use super::{ready, ResolutionOutcome, Resolving, Strategy};
use crate::base::request::TenantRequest;

/// Reads the tenant from a query parameter (`?tenant=acme`).
#[derive(Debug, Clone)]
pub struct QueryStrategy {
    parameter: String,
}

impl QueryStrategy {
    pub fn new(parameter: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
        }
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    pub fn extract(&self, request: &TenantRequest) -> ResolutionOutcome {
        ResolutionOutcome::from_candidate(request.query_param(&self.parameter).map(str::trim))
    }
}

impl Strategy for QueryStrategy {
    fn name(&self) -> &str {
        "query"
    }

    fn resolve<'a>(&'a self, request: &'a TenantRequest) -> Resolving<'a> {
        ready(self.extract(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_present() {
        let req = TenantRequest::new("example.com").with_query("tenant", "acme");
        let outcome = QueryStrategy::new("tenant").extract(&req);
        assert_eq!(outcome.identifier().unwrap(), "acme");
    }

    #[test]
    fn test_parameter_absent_or_empty() {
        let s = QueryStrategy::new("tenant");
        let req = TenantRequest::new("example.com").with_query("org", "acme");
        assert_eq!(s.extract(&req), ResolutionOutcome::NoMatch);

        let req = TenantRequest::new("example.com").with_query("tenant", "");
        assert_eq!(s.extract(&req), ResolutionOutcome::NoMatch);
    }
}
