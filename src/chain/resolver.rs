use super::config::ChainConfig;
use super::diagnostics::{Decision, DiagnosticRecord, DiagnosticsSink, TracingDiagnostics};
use crate::base::error::{FailureReason, ResolveError};
use crate::base::identifier::TenantIdentifier;
use crate::base::request::TenantRequest;
use crate::dns::{DnsCache, HickoryTxtLookup, TxtLookup};
use crate::strategy::{ResolutionOutcome, Strategy, StrategyKind};
use std::fmt;
use std::sync::Arc;

/// Successful outcome of a chain invocation.
///
/// Ambiguity and total failure are errors; see [`ChainResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        identifier: TenantIdentifier,
        /// Name of the first strategy, in chain order, that produced `identifier`.
        strategy: String,
        diagnostics: DiagnosticRecord,
    },
    NoTenant {
        diagnostics: DiagnosticRecord,
    },
}

impl Resolution {
    pub fn identifier(&self) -> Option<&TenantIdentifier> {
        match self {
            Resolution::Resolved { identifier, .. } => Some(identifier),
            Resolution::NoTenant { .. } => None,
        }
    }

    pub fn strategy(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { strategy, .. } => Some(strategy),
            Resolution::NoTenant { .. } => None,
        }
    }

    pub fn diagnostics(&self) -> &DiagnosticRecord {
        match self {
            Resolution::Resolved { diagnostics, .. } | Resolution::NoTenant { diagnostics } => {
                diagnostics
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn into_identifier(self) -> Option<TenantIdentifier> {
        match self {
            Resolution::Resolved { identifier, .. } => Some(identifier),
            Resolution::NoTenant { .. } => None,
        }
    }

    /// Applies a "require tenant" policy: `NoTenant` becomes
    /// [`ResolveError::ResolutionFailed`] with [`FailureReason::NoTenant`].
    pub fn require_tenant(self) -> Result<TenantIdentifier, ResolveError> {
        match self {
            Resolution::Resolved { identifier, .. } => Ok(identifier),
            Resolution::NoTenant { diagnostics } => Err(ResolveError::ResolutionFailed {
                reason: FailureReason::NoTenant,
                diagnostics: Box::new(diagnostics),
            }),
        }
    }
}

/// Runs an ordered list of strategies and reconciles their answers.
///
/// Two policies, selected by `strict`:
///
/// - **first match** (`strict = false`): the first strategy in order that
///   resolves wins; later strategies are not invoked.
/// - **strict**: every strategy runs. One distinct identifier resolves
///   (however many strategies agreed on it); two or more is
///   [`ResolveError::AmbiguousResolution`]. The chain never breaks a tie.
///
/// In both modes a failed strategy is logged and the chain moves on. If
/// every strategy failed the result is [`ResolveError::ResolutionFailed`].
///
/// Header trust is enforced by [`HeaderStrategy`](crate::strategy::HeaderStrategy),
/// which is bound to an allow-list when it is built.
///
/// The resolver holds no per-request state and is shared behind `Arc`
/// across tasks. The DNS cache, if any, is the only mutable part.
pub struct ChainResolver {
    strategies: Vec<Arc<dyn Strategy>>,
    strict: bool,
    dns_cache: Option<DnsCache>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl ChainResolver {
    /// Builds a chain from arbitrary strategies, evaluated in the given order.
    pub fn new(strategies: Vec<Arc<dyn Strategy>>, strict: bool) -> Self {
        Self {
            strategies,
            strict,
            dns_cache: None,
            sink: Arc::new(TracingDiagnostics),
        }
    }

    /// Builds the configured built-in strategies, using hickory-dns for TXT lookups.
    pub fn from_config(config: &ChainConfig) -> Result<Self, ResolveError> {
        let lookup = Arc::new(HickoryTxtLookup::new(config.dns_txt.timeout()));
        Self::from_config_with_lookup(config, lookup)
    }

    /// Like [`from_config`](Self::from_config) with a caller-supplied TXT lookup.
    pub fn from_config_with_lookup(
        config: &ChainConfig,
        lookup: Arc<dyn TxtLookup>,
    ) -> Result<Self, ResolveError> {
        let cache = config.dns_txt.build_cache();
        Self::from_config_with_cache(config, lookup, cache)
    }

    /// Builds from config, sharing an existing DNS cache.
    ///
    /// Chains built from the same cache see each other's TXT answers.
    pub fn from_config_with_cache(
        config: &ChainConfig,
        lookup: Arc<dyn TxtLookup>,
        cache: DnsCache,
    ) -> Result<Self, ResolveError> {
        let allow_list = config.allow_list()?;
        let kinds = config.strategy_kinds()?;
        let mut dns_cache = None;

        let mut strategies: Vec<Arc<dyn Strategy>> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let strategy: Arc<dyn Strategy> = match kind {
                StrategyKind::Subdomain => Arc::new(config.subdomain.build()?),
                StrategyKind::Path => Arc::new(config.path.build()?),
                StrategyKind::Header => {
                    let header = config.header.build(&allow_list)?;
                    if !header.is_allowed() {
                        tracing::warn!(
                            header = %header.header(),
                            allow_list = ?allow_list.names(),
                            "Header strategy is not allow-listed; it will always be skipped"
                        );
                    }
                    Arc::new(header)
                }
                StrategyKind::Query => Arc::new(config.query.build()?),
                StrategyKind::Domain => Arc::new(config.domain.build()?),
                StrategyKind::Hybrid => Arc::new(config.hybrid.build()?),
                StrategyKind::DnsTxt => {
                    dns_cache = Some(cache.clone());
                    Arc::new(config.dns_txt.build(lookup.clone(), cache.clone())?)
                }
            };
            strategies.push(strategy);
        }

        let resolver = Self {
            strategies,
            strict: config.strict,
            dns_cache,
            sink: Arc::new(TracingDiagnostics),
        };
        tracing::debug!(
            order = ?resolver.strategy_names(),
            strict = resolver.strict,
            "Tenant resolver chain built"
        );
        Ok(resolver)
    }

    /// Replaces the diagnostics sink (default: [`TracingDiagnostics`]).
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// The cache used by the DNS-TXT strategy, when one is configured.
    pub fn dns_cache(&self) -> Option<&DnsCache> {
        self.dns_cache.as_ref()
    }

    /// Resolves the tenant for one request.
    ///
    /// Returns `Ok` with a tenant or [`Resolution::NoTenant`], or one of the
    /// chain-level terminal errors, each carrying the full diagnostics. The
    /// diagnostics sink sees the record in every case.
    pub async fn resolve(&self, request: &TenantRequest) -> Result<Resolution, ResolveError> {
        let mut record = DiagnosticRecord::new(self.strict);
        let decision = if self.strict {
            self.resolve_strict(request, &mut record).await
        } else {
            self.resolve_first_match(request, &mut record).await
        };
        record.finish(decision.clone());
        self.sink.emit(&record);

        match decision {
            Decision::Resolved {
                identifier,
                strategy,
            } => Ok(Resolution::Resolved {
                identifier,
                strategy,
                diagnostics: record,
            }),
            Decision::NoTenant | Decision::Pending => Ok(Resolution::NoTenant {
                diagnostics: record,
            }),
            Decision::Ambiguous => {
                tracing::warn!(
                    host = %request.host(),
                    report = %record.render(),
                    "Ambiguous tenant resolution"
                );
                Err(ResolveError::AmbiguousResolution {
                    diagnostics: Box::new(record),
                })
            }
            Decision::Failed => Err(ResolveError::ResolutionFailed {
                reason: FailureReason::AllStrategiesFailed,
                diagnostics: Box::new(record),
            }),
        }
    }

    async fn resolve_first_match(
        &self,
        request: &TenantRequest,
        record: &mut DiagnosticRecord,
    ) -> Decision {
        for strategy in &self.strategies {
            if let ResolutionOutcome::Resolved(identifier) =
                invoke(strategy.as_ref(), request, record).await
            {
                return Decision::Resolved {
                    identifier,
                    strategy: strategy.name().to_string(),
                };
            }
        }
        unresolved(record)
    }

    async fn resolve_strict(
        &self,
        request: &TenantRequest,
        record: &mut DiagnosticRecord,
    ) -> Decision {
        for strategy in &self.strategies {
            invoke(strategy.as_ref(), request, record).await;
        }

        let mut distinct: Vec<(&str, &TenantIdentifier)> = Vec::new();
        for (strategy, identifier) in record.candidates() {
            if !distinct.iter().any(|(_, seen)| *seen == identifier) {
                distinct.push((strategy, identifier));
            }
        }

        match distinct.as_slice() {
            [] => unresolved(record),
            [(strategy, identifier)] => Decision::Resolved {
                identifier: (*identifier).clone(),
                strategy: strategy.to_string(),
            },
            _ => Decision::Ambiguous,
        }
    }
}

async fn invoke(
    strategy: &dyn Strategy,
    request: &TenantRequest,
    record: &mut DiagnosticRecord,
) -> ResolutionOutcome {
    let outcome = strategy.resolve(request).await;
    match &outcome {
        ResolutionOutcome::Failed(failure) => tracing::warn!(
            strategy = strategy.name(),
            host = %request.host(),
            error = %failure,
            "Tenant strategy failed, continuing with next"
        ),
        _ => tracing::debug!(
            strategy = strategy.name(),
            outcome = outcome.label(),
            "Tenant strategy evaluated"
        ),
    }
    record.record(strategy.name(), outcome.clone());
    outcome
}

/// `Failed` when a non-empty chain failed everywhere, `NoTenant` otherwise.
fn unresolved(record: &DiagnosticRecord) -> Decision {
    let all_failed =
        !record.entries.is_empty() && record.entries.iter().all(|e| e.outcome.is_failure());
    if all_failed {
        Decision::Failed
    } else {
        Decision::NoTenant
    }
}

impl fmt::Debug for ChainResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainResolver")
            .field("strategies", &self.strategy_names())
            .field("strict", &self.strict)
            .field("dns_cache", &self.dns_cache)
            .finish_non_exhaustive()
    }
}
