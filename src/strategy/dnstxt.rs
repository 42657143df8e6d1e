use super::{ResolutionOutcome, Resolving, Strategy, StrategyFailure};
use crate::base::request::TenantRequest;
use crate::dns::{DnsCache, Name, TxtLookup, TxtLookupError};
use std::{sync::Arc, time::Duration};

/// Resolves the tenant from a `_tenant.<host>` TXT record.
///
/// The first record, trimmed, must match the identifier grammar. Empty
/// answers and malformed records are `NoMatch`; timeouts and transport
/// errors are `Failed`, so they stay visible in diagnostics.
#[derive(Clone)]
pub struct DnsTxtStrategy {
    lookup: Arc<dyn TxtLookup>,
    cache: DnsCache,
    timeout: Duration,
}

impl DnsTxtStrategy {
    pub fn new(lookup: Arc<dyn TxtLookup>, cache: DnsCache, timeout: Duration) -> Self {
        Self {
            lookup,
            cache,
            timeout,
        }
    }

    pub fn cache(&self) -> &DnsCache {
        &self.cache
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn extract(&self, request: &TenantRequest) -> ResolutionOutcome {
        let Some(name) = Name::tenant_record(request.host()) else {
            return ResolutionOutcome::NoMatch;
        };
        self.cache
            .get_or_resolve(&name, || self.lookup_uncached(&name))
            .await
    }

    async fn lookup_uncached(&self, name: &Name) -> ResolutionOutcome {
        let lookup = tokio::time::timeout(self.timeout, self.lookup.lookup_txt(name.clone())).await;

        match lookup {
            Ok(Ok(records)) => {
                let outcome =
                    ResolutionOutcome::from_candidate(records.first().map(|r| r.trim()));
                tracing::debug!(query = %name, outcome = outcome.label(), "TXT record evaluated");
                outcome
            }
            Err(_) | Ok(Err(TxtLookupError::Timeout(_))) => {
                ResolutionOutcome::Failed(StrategyFailure::Timeout {
                    query: name.to_string(),
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
            Ok(Err(TxtLookupError::Transport(message))) => {
                ResolutionOutcome::Failed(StrategyFailure::Transport {
                    query: name.to_string(),
                    message,
                })
            }
        }
    }
}

impl Strategy for DnsTxtStrategy {
    fn name(&self) -> &str {
        "dns_txt"
    }

    fn resolve<'a>(&'a self, request: &'a TenantRequest) -> Resolving<'a> {
        Box::pin(self.extract(request))
    }
}

impl std::fmt::Debug for DnsTxtStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsTxtStrategy")
            .field("cache", &self.cache)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{TxtLookupFuture, TxtRecords};
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Answer {
        Records(TxtRecords),
        Fail(TxtLookupError),
        Hang,
    }

    struct MockLookup {
        answer: Answer,
        calls: AtomicUsize,
    }

    impl MockLookup {
        fn new(answer: Answer) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl TxtLookup for MockLookup {
        fn lookup_txt(&self, _name: Name) -> TxtLookupFuture {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Answer::Records(r) => Box::pin(std::future::ready(Ok(r.clone()))),
                Answer::Fail(e) => Box::pin(std::future::ready(Err(e.clone()))),
                Answer::Hang => {
                    Box::pin(std::future::pending::<Result<TxtRecords, TxtLookupError>>())
                }
            }
        }
    }

    fn strategy(lookup: Arc<MockLookup>) -> DnsTxtStrategy {
        DnsTxtStrategy::new(lookup, DnsCache::disabled(), Duration::from_secs(2))
    }

    fn request() -> TenantRequest {
        TenantRequest::new("acme.com")
    }

    #[tokio::test]
    async fn test_first_record_trimmed() {
        let lookup = MockLookup::new(Answer::Records(vec![" acme ".into(), "other".into()]));
        let outcome = strategy(lookup).extract(&request()).await;
        assert_eq!(outcome.identifier().unwrap(), "acme");
    }

    #[tokio::test]
    async fn test_empty_or_malformed_is_no_match() {
        let empty = MockLookup::new(Answer::Records(vec![]));
        assert_eq!(strategy(empty).extract(&request()).await, ResolutionOutcome::NoMatch);

        let bad = MockLookup::new(Answer::Records(vec!["v=spf1 -all".into()]));
        assert_eq!(strategy(bad).extract(&request()).await, ResolutionOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let lookup = MockLookup::new(Answer::Fail(TxtLookupError::Transport("SERVFAIL".into())));
        let outcome = strategy(lookup).extract(&request()).await;
        assert_eq!(
            outcome,
            ResolutionOutcome::Failed(StrategyFailure::Transport {
                query: "_tenant.acme.com".into(),
                message: "SERVFAIL".into(),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let lookup = MockLookup::new(Answer::Hang);
        let outcome = strategy(lookup).extract(&request()).await;
        assert_eq!(
            outcome,
            ResolutionOutcome::Failed(StrategyFailure::Timeout {
                query: "_tenant.acme.com".into(),
                timeout_ms: 2000,
            })
        );
    }

    #[tokio::test]
    async fn test_ip_hosts_skip_lookup() {
        let lookup = MockLookup::new(Answer::Records(vec!["acme".into()]));
        let s = strategy(lookup.clone());
        let outcome = s.extract(&TenantRequest::new("10.0.0.1:8080")).await;
        assert_eq!(outcome, ResolutionOutcome::NoMatch);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cached_answer_reused() {
        let lookup = MockLookup::new(Answer::Records(vec!["acme".into()]));
        let s = DnsTxtStrategy::new(lookup.clone(), DnsCache::default(), Duration::from_secs(2));

        for _ in 0..3 {
            assert!(s.extract(&request()).await.is_resolved());
        }
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }
}
