//! Chain resolution performance benchmark.

use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use tenantchain::dns::{DnsCache, Name, TxtLookup, TxtLookupFuture};
use tenantchain::{ChainConfig, ChainResolver, TenantRequest};

struct StaticLookup;

impl TxtLookup for StaticLookup {
    fn lookup_txt(&self, _name: Name) -> TxtLookupFuture {
        Box::pin(async { Ok(vec!["acme".to_string()]) })
    }
}

fn pure_chain(strict: bool) -> ChainResolver {
    let config = ChainConfig::from_json_str(&format!(
        r#"{{
            "order": ["header", "subdomain", "path", "query", "hybrid"],
            "strict": {strict},
            "subdomain": {{"base_domain": "example.com"}},
            "hybrid": {{
                "subdomain_patterns": [
                    {{"pattern": "*.example.com", "strategy": "use_subdomain_as_slug"}}
                ]
            }}
        }}"#
    ))
    .unwrap();
    ChainResolver::from_config(&config).unwrap()
}

fn chain_pure_strategies(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let request = TenantRequest::new("acme.example.com")
        .with_header("X-Tenant-Id", "acme")
        .unwrap()
        .with_path("/acme/dashboard");

    let first_match = pure_chain(false);
    c.bench_function("chain_first_match", |b| {
        b.to_async(&rt).iter(|| first_match.resolve(&request))
    });

    let strict = pure_chain(true);
    c.bench_function("chain_strict_consensus", |b| {
        b.to_async(&rt).iter(|| strict.resolve(&request))
    });
}

fn chain_cached_dns(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let config = ChainConfig::from_json_str(r#"{"order": ["dns_txt"]}"#).unwrap();
    let cache = DnsCache::new(Duration::from_secs(3600));
    let resolver =
        ChainResolver::from_config_with_cache(&config, Arc::new(StaticLookup), cache).unwrap();
    let request = TenantRequest::new("acme.com");

    c.bench_function("chain_dns_txt_cache_hit", |b| {
        b.to_async(&rt).iter(|| resolver.resolve(&request))
    });
}

criterion_group!(benches, chain_pure_strategies, chain_cached_dns);
criterion_main!(benches);
