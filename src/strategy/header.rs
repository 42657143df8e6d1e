use super::{ready, ResolutionOutcome, Resolving, SkipReason, Strategy};
use crate::base::error::ResolveError;
use crate::base::request::TenantRequest;
use crate::security::HeaderAllowList;
use http::header::HeaderName;
use std::str::FromStr;

/// Reads the tenant from a single request header.
///
/// The header must be allow-listed. Otherwise every invocation is
/// [`ResolutionOutcome::Skipped`], even when the header is present and valid.
#[derive(Debug, Clone)]
pub struct HeaderStrategy {
    header: HeaderName,
    allowed: bool,
}

impl HeaderStrategy {
    pub fn new(header: &str, allow_list: &HeaderAllowList) -> Result<Self, ResolveError> {
        let header = HeaderName::from_str(header.trim()).map_err(|_| {
            ResolveError::InvalidHeader {
                name: header.to_string(),
            }
        })?;
        let allowed = allow_list.permits(&header);
        Ok(Self { header, allowed })
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn extract(&self, request: &TenantRequest) -> ResolutionOutcome {
        if !self.allowed {
            return ResolutionOutcome::Skipped(SkipReason::HeaderNotAllowListed {
                header: self.header.as_str().to_string(),
            });
        }

        ResolutionOutcome::from_candidate(request.header(&self.header).map(str::trim))
    }
}

impl Strategy for HeaderStrategy {
    fn name(&self) -> &str {
        "header"
    }

    fn resolve<'a>(&'a self, request: &'a TenantRequest) -> Resolving<'a> {
        ready(self.extract(request))
    }
}
