use crate::chain::diagnostics::DiagnosticRecord;
use thiserror::Error;

/// Why a chain produced no usable tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Every configured strategy failed (timeouts, transport errors).
    AllStrategiesFailed,
    /// No strategy matched and the caller requires a tenant.
    NoTenant,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::AllStrategiesFailed => f.write_str("every strategy failed"),
            FailureReason::NoTenant => f.write_str("no strategy matched"),
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum ResolveError {
    // Configuration errors (raised at build time, never per request)
    #[error("Invalid tenant identifier: {value:?}")]
    InvalidIdentifier { value: String },
    #[error("Invalid resolver configuration: {message}")]
    InvalidConfig { message: String },
    #[error("Unknown resolution strategy: {name}")]
    UnknownStrategy { name: String },
    #[error("Invalid subdomain pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("Invalid header name: {name:?}")]
    InvalidHeader { name: String },
    #[error("Failed to parse resolver configuration: {message}")]
    ConfigParse { message: String },
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    // Chain-level terminal states
    #[error("Ambiguous tenant resolution: {}", describe_candidates(.diagnostics))]
    AmbiguousResolution { diagnostics: Box<DiagnosticRecord> },
    #[error("Tenant resolution failed: {reason}")]
    ResolutionFailed {
        reason: FailureReason,
        diagnostics: Box<DiagnosticRecord>,
    },

    // Registry
    #[error("Tenant not found: {identifier}")]
    TenantNotFound { identifier: String },
}

impl ResolveError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ResolveError::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolveError::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Stable label for metrics and structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::InvalidIdentifier { .. } => "invalid_identifier",
            ResolveError::InvalidConfig { .. } => "invalid_config",
            ResolveError::UnknownStrategy { .. } => "unknown_strategy",
            ResolveError::InvalidPattern { .. } => "invalid_pattern",
            ResolveError::InvalidHeader { .. } => "invalid_header",
            ResolveError::ConfigParse { .. } => "config_parse",
            ResolveError::Io { .. } => "io",
            ResolveError::AmbiguousResolution { .. } => "ambiguous_resolution",
            ResolveError::ResolutionFailed { .. } => "resolution_failed",
            ResolveError::TenantNotFound { .. } => "tenant_not_found",
        }
    }

    /// Returns true for errors caused by bad configuration rather than a request.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ResolveError::InvalidIdentifier { .. }
                | ResolveError::InvalidConfig { .. }
                | ResolveError::UnknownStrategy { .. }
                | ResolveError::InvalidPattern { .. }
                | ResolveError::InvalidHeader { .. }
                | ResolveError::ConfigParse { .. }
                | ResolveError::Io { .. }
        )
    }

    /// Diagnostics attached to chain-level failures.
    pub fn diagnostics(&self) -> Option<&DiagnosticRecord> {
        match self {
            ResolveError::AmbiguousResolution { diagnostics }
            | ResolveError::ResolutionFailed { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(err: serde_json::Error) -> Self {
        ResolveError::ConfigParse {
            message: err.to_string(),
        }
    }
}

fn describe_candidates(record: &DiagnosticRecord) -> String {
    record
        .candidates()
        .map(|(strategy, identifier)| format!("{strategy}={identifier}"))
        .collect::<Vec<_>>()
        .join(", ")
}
