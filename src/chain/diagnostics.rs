//! Per-request resolution diagnostics.
//!
//! A [`DiagnosticRecord`] lists every strategy the chain invoked, in
//! order, with its outcome, plus the final decision. It is built fresh for
//! each request and handed to a [`DiagnosticsSink`]; this crate never
//! stores it.

use crate::base::identifier::TenantIdentifier;
use crate::strategy::{ResolutionOutcome, SkipReason, StrategyFailure};
use serde::Serialize;
use std::fmt::{self, Write as _};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    pub strategy: String,
    #[serde(flatten)]
    pub outcome: ResolutionOutcome,
}

/// Final decision of one chain invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The chain is still running.
    Pending,
    Resolved {
        identifier: TenantIdentifier,
        strategy: String,
    },
    NoTenant,
    /// Strict mode saw two or more distinct identifiers.
    Ambiguous,
    /// Every strategy failed.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRecord {
    pub strict: bool,
    pub entries: Vec<DiagnosticEntry>,
    pub decision: Decision,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub elapsed_us: u64,
    #[serde(skip)]
    clock: std::time::Instant,
}

impl DiagnosticRecord {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            entries: Vec::new(),
            decision: Decision::Pending,
            started_at: OffsetDateTime::now_utc(),
            elapsed_us: 0,
            clock: std::time::Instant::now(),
        }
    }

    pub fn record(&mut self, strategy: impl Into<String>, outcome: ResolutionOutcome) {
        self.entries.push(DiagnosticEntry {
            strategy: strategy.into(),
            outcome,
        });
    }

    /// Sets the decision and stamps the elapsed time.
    pub fn finish(&mut self, decision: Decision) {
        self.decision = decision;
        self.elapsed_us = u64::try_from(self.clock.elapsed().as_micros()).unwrap_or(u64::MAX);
    }

    /// `(strategy, identifier)` for every resolving strategy, in chain order.
    pub fn candidates(&self) -> impl Iterator<Item = (&str, &TenantIdentifier)> {
        self.entries.iter().filter_map(|e| {
            e.outcome
                .identifier()
                .map(|id| (e.strategy.as_str(), id))
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            ResolutionOutcome::Skipped(reason) => Some((e.strategy.as_str(), reason)),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &StrategyFailure)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            ResolutionOutcome::Failed(failure) => Some((e.strategy.as_str(), failure)),
            _ => None,
        })
    }

    pub fn outcome_of(&self, strategy: &str) -> Option<&ResolutionOutcome> {
        self.entries
            .iter()
            .find(|e| e.strategy == strategy)
            .map(|e| &e.outcome)
    }

    /// Human-readable report, one line per strategy, then the decision.
    ///
    /// ```text
    /// mode: strict
    ///   1. header     resolved   tenant1
    ///   2. query      resolved   tenant2
    /// decision: ambiguous (header=tenant1, query=tenant2)
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mode = if self.strict { "strict" } else { "first-match" };
        let _ = writeln!(out, "mode: {mode}");

        for (i, entry) in self.entries.iter().enumerate() {
            let detail = match &entry.outcome {
                ResolutionOutcome::Resolved(id) => id.to_string(),
                ResolutionOutcome::NoMatch => String::new(),
                ResolutionOutcome::Skipped(reason) => reason.to_string(),
                ResolutionOutcome::Failed(failure) => failure.to_string(),
            };
            let _ = writeln!(
                out,
                "  {}. {:<10} {:<10} {}",
                i + 1,
                entry.strategy,
                entry.outcome.label(),
                detail
            );
        }

        let _ = write!(out, "decision: {}", self.decision);
        if self.decision == Decision::Ambiguous {
            let candidates: Vec<String> = self
                .candidates()
                .map(|(s, id)| format!("{s}={id}"))
                .collect();
            let _ = write!(out, " ({})", candidates.join(", "));
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Pending => f.write_str("pending"),
            Decision::Resolved {
                identifier,
                strategy,
            } => write!(f, "resolved {identifier} via {strategy}"),
            Decision::NoTenant => f.write_str("no tenant"),
            Decision::Ambiguous => f.write_str("ambiguous"),
            Decision::Failed => f.write_str("failed"),
        }
    }
}

impl PartialEq for DiagnosticRecord {
    fn eq(&self, other: &Self) -> bool {
        self.strict == other.strict
            && self.entries == other.entries
            && self.decision == other.decision
    }
}

impl Eq for DiagnosticRecord {}

/// Receives the record of every chain invocation.
///
/// Implemented by the host's logging or metrics layer. Called on the
/// request path, so implementations should not block.
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, record: &DiagnosticRecord);
}

/// Default sink: one `tracing` debug event per resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn emit(&self, record: &DiagnosticRecord) {
        tracing::debug!(
            decision = %record.decision,
            strict = record.strict,
            strategies = record.entries.len(),
            elapsed_us = record.elapsed_us,
            report = %record.render(),
            "tenant resolution finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TenantIdentifier {
        TenantIdentifier::new(s).unwrap()
    }

    fn sample() -> DiagnosticRecord {
        let mut record = DiagnosticRecord::new(true);
        record.record("header", ResolutionOutcome::Resolved(id("tenant1")));
        record.record(
            "dns_txt",
            ResolutionOutcome::Failed(StrategyFailure::Timeout {
                query: "_tenant.acme.com".into(),
                timeout_ms: 5000,
            }),
        );
        record.record("query", ResolutionOutcome::Resolved(id("tenant2")));
        record.finish(Decision::Ambiguous);
        record
    }

    #[test]
    fn test_candidates_in_order() {
        let record = sample();
        let candidates: Vec<_> = record
            .candidates()
            .map(|(s, id)| (s.to_string(), id.to_string()))
            .collect();
        assert_eq!(
            candidates,
            vec![
                ("header".to_string(), "tenant1".to_string()),
                ("query".to_string(), "tenant2".to_string())
            ]
        );
        assert_eq!(record.failures().count(), 1);
        assert_eq!(record.skipped().count(), 0);
    }

    #[test]
    fn test_render() {
        let report = sample().render();
        assert!(report.starts_with("mode: strict\n"));
        assert!(report.contains("1. header     resolved   tenant1"));
        assert!(report.contains("lookup of _tenant.acme.com timed out after 5000ms"));
        assert!(report.ends_with("decision: ambiguous (header=tenant1, query=tenant2)"));
    }

    #[test]
    fn test_json_shape() {
        let json = sample().to_json();
        assert_eq!(json["strict"], true);
        assert_eq!(json["decision"]["decision"], "ambiguous");
        assert_eq!(json["entries"][0]["strategy"], "header");
        assert_eq!(json["entries"][0]["outcome"], "resolved");
        assert_eq!(json["entries"][0]["detail"], "tenant1");
        assert!(json["started_at"].is_string());
    }

    #[test]
    fn test_outcome_of() {
        let record = sample();
        assert!(record.outcome_of("query").unwrap().is_resolved());
        assert!(record.outcome_of("path").is_none());
    }
}
