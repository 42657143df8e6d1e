//! Chain Resolver Tests
//!
//! Covers:
//! - First-match and strict consensus over config-built chains
//! - Ambiguity diagnostics and their ordering
//! - Recovery from DNS failures, all-failed chains
//! - Idempotence and diagnostics sinks

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tenantchain::chain::{Decision, DiagnosticsSink};
use tenantchain::dns::{Name, TxtLookup, TxtLookupError, TxtLookupFuture, TxtRecords};
use tenantchain::security::HeaderAllowList;
use tenantchain::strategy::{HeaderStrategy, QueryStrategy, ResolutionOutcome, StrategyFailure};
use tenantchain::{
    ChainConfig, ChainResolver, DiagnosticRecord, FailureReason, ResolveError, Strategy,
    TenantRequest,
};

/// Static TXT answers; names without an entry fail with SERVFAIL.
struct StaticTxt(HashMap<String, TxtRecords>);

impl StaticTxt {
    fn new(entries: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self(
            entries
                .iter()
                .map(|(name, record)| (name.to_string(), vec![record.to_string()]))
                .collect(),
        ))
    }
}

impl TxtLookup for StaticTxt {
    fn lookup_txt(&self, name: Name) -> TxtLookupFuture {
        let answer = self
            .0
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| TxtLookupError::Transport("SERVFAIL".into()));
        Box::pin(async move { answer })
    }
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<DiagnosticRecord>>);

impl DiagnosticsSink for RecordingSink {
    fn emit(&self, record: &DiagnosticRecord) {
        self.0.lock().unwrap().push(record.clone());
    }
}

fn config(json: &str) -> ChainConfig {
    ChainConfig::from_json_str(json).unwrap()
}

fn build(json: &str) -> ChainResolver {
    ChainResolver::from_config_with_lookup(&config(json), StaticTxt::new(&[])).unwrap()
}

fn header_and_query(tenant1: &str, tenant2: &str) -> TenantRequest {
    TenantRequest::new("app.example.com")
        .with_header("X-Tenant-Id", tenant1)
        .unwrap()
        .with_query("tenant", tenant2)
}

#[tokio::test]
async fn test_single_match_resolves_in_both_modes() {
    for strict in [false, true] {
        let resolver = build(&format!(
            r#"{{"order": ["header", "query", "path"], "strict": {strict}}}"#
        ));
        let request = TenantRequest::new("example.com").with_query("tenant", "acme");

        let resolution = resolver.resolve(&request).await.unwrap();
        assert_eq!(resolution.identifier().unwrap(), "acme");
        assert_eq!(resolution.strategy(), Some("query"));
    }
}

#[tokio::test]
async fn test_strict_ambiguity_scenario() {
    let resolver = build(r#"{"order": ["header", "query"], "strict": true}"#);
    let err = resolver
        .resolve(&header_and_query("tenant1", "tenant2"))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::AmbiguousResolution { .. }));
    assert_eq!(
        err.to_string(),
        "Ambiguous tenant resolution: header=tenant1, query=tenant2"
    );

    let diagnostics = err.diagnostics().unwrap();
    let strategies: Vec<_> = diagnostics.entries.iter().map(|e| e.strategy.as_str()).collect();
    assert_eq!(strategies, ["header", "query"]);
}

#[tokio::test]
async fn test_ambiguity_follows_configured_order() {
    let resolver = build(r#"{"order": ["query", "header"], "strict": true}"#);
    let err = resolver
        .resolve(&header_and_query("tenant1", "tenant2"))
        .await
        .unwrap_err();

    let candidates: Vec<_> = err
        .diagnostics()
        .unwrap()
        .candidates()
        .map(|(s, id)| format!("{s}={id}"))
        .collect();
    assert_eq!(candidates, ["query=tenant2", "header=tenant1"]);
}

#[tokio::test]
async fn test_non_strict_first_in_order_wins() {
    let request = header_and_query("tenant1", "tenant2");

    let resolver = build(r#"{"order": ["header", "query"]}"#);
    let resolution = resolver.resolve(&request).await.unwrap();
    assert_eq!(resolution.identifier().unwrap(), "tenant1");

    let resolver = build(r#"{"order": ["query", "header"]}"#);
    let resolution = resolver.resolve(&request).await.unwrap();
    assert_eq!(resolution.identifier().unwrap(), "tenant2");
}

#[tokio::test]
async fn test_strict_agreement_is_not_ambiguous() {
    let resolver = build(
        r#"{
            "order": ["subdomain", "header", "query"],
            "strict": true,
            "subdomain": {"base_domain": "example.com"}
        }"#,
    );
    let request = TenantRequest::new("acme.example.com")
        .with_header("X-Tenant-Id", "acme")
        .unwrap()
        .with_query("tenant", "acme");

    let resolution = resolver.resolve(&request).await.unwrap();
    assert_eq!(resolution.identifier().unwrap(), "acme");
    assert_eq!(resolution.strategy(), Some("subdomain"));
    assert_eq!(resolution.diagnostics().candidates().count(), 3);
}

#[tokio::test]
async fn test_skipped_header_is_distinct_from_no_match() {
    let resolver = build(
        r#"{
            "order": ["header", "query"],
            "header_allow_list": ["X-Tenant-Id"],
            "header": {"name": "X-Tenant-Slug"}
        }"#,
    );
    let request = TenantRequest::new("example.com")
        .with_header("X-Tenant-Slug", "acme")
        .unwrap();

    let resolution = resolver.resolve(&request).await.unwrap();
    assert!(!resolution.is_resolved());

    let diagnostics = resolution.diagnostics();
    assert!(matches!(
        diagnostics.outcome_of("header"),
        Some(ResolutionOutcome::Skipped(_))
    ));
    assert_eq!(
        diagnostics.outcome_of("query"),
        Some(&ResolutionOutcome::NoMatch)
    );
    assert!(diagnostics.render().contains("header x-tenant-slug is not allow-listed"));
}

#[tokio::test]
async fn test_hand_built_chain_skips_untrusted_header() {
    let allow_list = HeaderAllowList::new(["X-Tenant-Id"]).unwrap();
    let strategies: Vec<Arc<dyn Strategy>> = vec![
        Arc::new(HeaderStrategy::new("X-Tenant-Slug", &allow_list).unwrap()),
        Arc::new(QueryStrategy::new("tenant")),
    ];
    let request = TenantRequest::new("example.com")
        .with_header("X-Tenant-Slug", "acme")
        .unwrap()
        .with_query("tenant", "beta");

    for strict in [false, true] {
        let resolver = ChainResolver::new(strategies.clone(), strict);
        let resolution = resolver.resolve(&request).await.unwrap();

        assert_eq!(resolution.identifier().unwrap(), "beta");
        assert_eq!(resolution.strategy(), Some("query"));
        assert!(matches!(
            resolution.diagnostics().outcome_of("header"),
            Some(ResolutionOutcome::Skipped(_))
        ));
    }
}

#[tokio::test]
async fn test_dns_failure_is_recovered() {
    let config = config(r#"{"order": ["dns_txt", "query"], "strict": true}"#);
    let resolver = ChainResolver::from_config_with_lookup(&config, StaticTxt::new(&[])).unwrap();
    let request = TenantRequest::new("acme.com").with_query("tenant", "acme");

    let resolution = resolver.resolve(&request).await.unwrap();
    assert_eq!(resolution.identifier().unwrap(), "acme");

    let failures: Vec<_> = resolution.diagnostics().failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "dns_txt");
    assert!(matches!(failures[0].1, StrategyFailure::Transport { .. }));
}

#[tokio::test]
async fn test_dns_txt_in_consensus() {
    let config = config(r#"{"order": ["header", "dns_txt"], "strict": true}"#);
    let lookup = StaticTxt::new(&[("_tenant.acme.com", "other")]);
    let resolver = ChainResolver::from_config_with_lookup(&config, lookup).unwrap();
    let request = TenantRequest::new("acme.com")
        .with_header("X-Tenant-Id", "acme")
        .unwrap();

    let err = resolver.resolve(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "Ambiguous tenant resolution: header=acme, dns_txt=other");
}

#[tokio::test]
async fn test_all_strategies_failed() {
    let config = config(r#"{"order": ["dns_txt"]}"#);
    let resolver = ChainResolver::from_config_with_lookup(&config, StaticTxt::new(&[])).unwrap();

    let err = resolver
        .resolve(&TenantRequest::new("acme.com"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::ResolutionFailed {
            reason: FailureReason::AllStrategiesFailed,
            ..
        }
    ));
    assert_eq!(err.diagnostics().unwrap().decision, Decision::Failed);
}

#[tokio::test]
async fn test_no_tenant_and_require_policy() {
    let resolver = build(r#"{"order": ["header", "query"], "strict": true}"#);
    let resolution = resolver
        .resolve(&TenantRequest::new("example.com"))
        .await
        .unwrap();

    assert!(resolution.identifier().is_none());
    assert_eq!(resolution.diagnostics().decision, Decision::NoTenant);

    let err = resolution.require_tenant().unwrap_err();
    assert!(matches!(
        err,
        ResolveError::ResolutionFailed {
            reason: FailureReason::NoTenant,
            ..
        }
    ));
}

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let resolver = build(
        r#"{
            "order": ["hybrid", "header"],
            "strict": true,
            "hybrid": {
                "domains": {"client-a.com": "client-a"},
                "subdomain_patterns": [
                    {"pattern": "*.myplatform.com", "strategy": "use_subdomain_as_slug"}
                ]
            }
        }"#,
    );
    let request = TenantRequest::new("beta.myplatform.com")
        .with_header("X-Tenant-Id", "beta")
        .unwrap();

    let first = resolver.resolve(&request).await.unwrap();
    let second = resolver.resolve(&request).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.identifier().unwrap(), "beta");
}

#[tokio::test]
async fn test_sink_receives_records() {
    let sink = Arc::new(RecordingSink::default());
    let resolver =
        build(r#"{"order": ["header", "query"], "strict": true}"#).with_sink(sink.clone());

    resolver
        .resolve(&header_and_query("tenant1", "tenant1"))
        .await
        .unwrap();
    resolver
        .resolve(&header_and_query("tenant1", "tenant2"))
        .await
        .unwrap_err();

    let records = sink.0.lock().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].decision, Decision::Ambiguous);

    let json = records[1].to_json();
    assert_eq!(json["entries"][1]["strategy"], "query");
    assert_eq!(json["entries"][1]["detail"], "tenant2");
}

#[tokio::test]
async fn test_resolver_is_shareable_across_tasks() {
    let resolver = Arc::new(build(r#"{"order": ["query"]}"#));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let resolver = resolver.clone();
            tokio::spawn(async move {
                let request =
                    TenantRequest::new("example.com").with_query("tenant", &format!("t{i}"));
                let resolution = resolver.resolve(&request).await;
                resolution.map(|r| r.into_identifier())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let identifier = handle.await.unwrap().unwrap().unwrap();
        assert_eq!(identifier.as_str(), format!("t{i}"));
    }
}

#[test]
fn test_invalid_configs_fail_to_build() {
    let cases = [
        r#"{"order": []}"#,
        r#"{"order": ["subdomain"]}"#,
        r#"{"order": ["query", "query"]}"#,
        r#"{"order": ["dns_txt"], "dns_txt": {"timeout_secs": 31}}"#,
        r#"{"order": ["hybrid"], "hybrid": {"subdomain_patterns": [{"pattern": "myplatform.com", "strategy": "use_subdomain_as_slug"}]}}"#,
        r#"{"order": ["domain"], "domain": {"domains": {"a.com": "Not Valid"}}}"#,
    ];

    for json in cases {
        let err = ChainResolver::from_config_with_lookup(&config(json), StaticTxt::new(&[]))
            .unwrap_err();
        assert!(err.is_config_error(), "{json}: {err}");
    }
}
