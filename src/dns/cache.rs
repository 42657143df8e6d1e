//! Time-bounded cache for DNS-TXT tenant lookups.
//!
//! Keys are query names (`_tenant.<host>`), values are the answer the
//! lookup produced: an identifier, or its absence. Negative answers are
//! cached too, so a TXT record published after a miss stays invisible for
//! up to `negative_ttl`. Transport failures and timeouts are never cached.
//!
//! Entries expire lazily: an expired entry is treated as a miss and
//! replaced by the next lookup. [`DnsCache::purge_expired`] drops them
//! eagerly for hosts that want to bound memory.
//!
//! A lookup abandoned mid-flight (request cancelled) writes nothing. A
//! lookup that finishes after another one already refreshed the same key
//! simply overwrites it; keys depend only on the query name.

use super::Name;
use crate::base::identifier::TenantIdentifier;
use crate::strategy::ResolutionOutcome;
use dashmap::DashMap;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::Instant;

/// Default positive TTL.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry {
    answer: Option<TenantIdentifier>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    fn outcome(&self) -> ResolutionOutcome {
        match &self.answer {
            Some(id) => ResolutionOutcome::Resolved(id.clone()),
            None => ResolutionOutcome::NoMatch,
        }
    }
}

/// Thread-safe DNS answer cache.
///
/// Cloning shares the underlying map, so one cache can serve every chain in
/// the process.
#[derive(Debug, Clone)]
pub struct DnsCache {
    entries: Arc<DashMap<Name, CacheEntry>>,
    ttl: Duration,
    negative_ttl: Duration,
    enabled: bool,
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl DnsCache {
    /// Creates an enabled cache; negative answers share the positive TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            negative_ttl: ttl,
            enabled: true,
        }
    }

    /// Creates a pass-through cache that stores nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Duration::ZERO)
        }
    }

    pub fn with_negative_ttl(mut self, negative_ttl: Duration) -> Self {
        self.negative_ttl = negative_ttl;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn negative_ttl(&self) -> Duration {
        self.negative_ttl
    }

    /// Returns the cached outcome for `name`, or runs `resolve` and caches its result.
    ///
    /// Only `Resolved` and `NoMatch` outcomes are stored. The map is not
    /// locked while `resolve` runs, so concurrent misses on the same name may
    /// each perform a lookup; the last writer wins.
    pub async fn get_or_resolve<F, Fut>(&self, name: &Name, resolve: F) -> ResolutionOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResolutionOutcome>,
    {
        if !self.enabled {
            return resolve().await;
        }

        if let Some(outcome) = self.get(name) {
            tracing::debug!(query = %name, outcome = outcome.label(), "DNS cache hit");
            return outcome;
        }

        let outcome = resolve().await;
        self.store(name, &outcome);
        outcome
    }

    /// Returns a live cached outcome without resolving.
    pub fn get(&self, name: &Name) -> Option<ResolutionOutcome> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();
        let cached = self.entries.get(name).map(|entry| {
            if entry.is_expired(now) {
                None
            } else {
                Some(entry.outcome())
            }
        })?;

        if cached.is_none() {
            self.entries.remove_if(name, |_, entry| entry.is_expired(now));
        }
        cached
    }

    /// Stores a cacheable outcome. Failures and skips are ignored.
    pub fn store(&self, name: &Name, outcome: &ResolutionOutcome) {
        if !self.enabled {
            return;
        }

        let (answer, ttl) = match outcome {
            ResolutionOutcome::Resolved(id) => (Some(id.clone()), self.ttl),
            ResolutionOutcome::NoMatch => (None, self.negative_ttl),
            ResolutionOutcome::Skipped(_) | ResolutionOutcome::Failed(_) => return,
        };

        if ttl.is_zero() {
            return;
        }

        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            tracing::warn!(query = %name, ?ttl, "DNS cache TTL overflows the clock, not caching");
            return;
        };
        self.entries.insert(name.clone(), CacheEntry { answer, expires_at });
    }

    pub fn invalidate(&self, name: &Name) {
        self.entries.remove(name);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
