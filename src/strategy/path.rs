use super::subdomain::excluded_set;
use super::{ready, ResolutionOutcome, Resolving, Strategy};
use crate::base::error::ResolveError;
use crate::base::request::TenantRequest;
use std::collections::HashSet;

/// Which path segment carries the tenant. Positions count non-empty segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentPosition {
    #[default]
    FirstNonEmpty,
    ZeroBased(usize),
    OneBased(usize),
}

impl SegmentPosition {
    /// Builds a position from config values. `OneBased(0)` is rejected.
    pub fn from_config(position: Option<usize>, one_based: bool) -> Result<Self, ResolveError> {
        match (position, one_based) {
            (None, _) => Ok(SegmentPosition::FirstNonEmpty),
            (Some(0), true) => Err(ResolveError::invalid_config(
                "path.position must be >= 1 when path.one_based is set",
            )),
            (Some(n), true) => Ok(SegmentPosition::OneBased(n)),
            (Some(n), false) => Ok(SegmentPosition::ZeroBased(n)),
        }
    }

    fn index(&self) -> Option<usize> {
        match *self {
            SegmentPosition::FirstNonEmpty => Some(0),
            SegmentPosition::ZeroBased(n) => Some(n),
            SegmentPosition::OneBased(n) => n.checked_sub(1),
        }
    }
}

/// Resolves `/<tenant>/...` style paths.
#[derive(Debug, Clone, Default)]
pub struct PathStrategy {
    position: SegmentPosition,
    excluded: HashSet<String>,
}

impl PathStrategy {
    pub fn new(position: SegmentPosition) -> Self {
        Self {
            position,
            excluded: HashSet::new(),
        }
    }

    /// Segments that are routes, not tenants (`api`, `health`, ...).
    pub fn with_excluded<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded = excluded_set(segments);
        self
    }

    pub fn extract(&self, request: &TenantRequest) -> ResolutionOutcome {
        let segment = self
            .position
            .index()
            .and_then(|i| request.path_segments().get(i))
            .map(String::as_str)
            .filter(|s| !self.excluded.contains(&s.to_ascii_lowercase()));

        ResolutionOutcome::from_candidate(segment)
    }
}

impl Strategy for PathStrategy {
    fn name(&self) -> &str {
        "path"
    }

    fn resolve<'a>(&'a self, request: &'a TenantRequest) -> Resolving<'a> {
        ready(self.extract(request))
    }
}
