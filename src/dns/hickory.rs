//! TXT lookups backed by hickory-dns.
//!
//! Reads the system DNS configuration (`/etc/resolv.conf` and friends) on
//! first use and falls back to hickory's defaults when that fails. The
//! resolver is built lazily so constructing a [`HickoryTxtLookup`] never
//! touches the network or requires a running runtime.

use super::{Name, TxtLookup, TxtLookupError, TxtLookupFuture, TxtRecords};
use hickory_resolver::{config::ResolverConfig, name_server::TokioConnectionProvider, TokioResolver};
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

/// Default per-query timeout handed to the underlying resolver.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Async TXT lookup backed by hickory-dns.
///
/// Cloning is cheap; clones share the lazily built resolver and its
/// connection pool.
#[derive(Debug, Clone)]
pub struct HickoryTxtLookup {
    resolver: Arc<OnceLock<TokioResolver>>,
    timeout: Duration,
}

impl HickoryTxtLookup {
    pub fn new(timeout: Duration) -> Self {
        Self {
            resolver: Arc::new(OnceLock::new()),
            timeout,
        }
    }

    fn resolver(&self) -> &TokioResolver {
        self.resolver.get_or_init(|| {
            let mut builder = match TokioResolver::builder_tokio() {
                Ok(builder) => {
                    tracing::debug!("Using system DNS configuration");
                    builder
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to read system DNS config, using defaults"
                    );
                    TokioResolver::builder_with_config(
                        ResolverConfig::default(),
                        TokioConnectionProvider::default(),
                    )
                }
            };

            let options = builder.options_mut();
            options.timeout = self.timeout;
            options.attempts = 1;

            builder.build()
        })
    }
}

impl Default for HickoryTxtLookup {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_TIMEOUT)
    }
}

impl TxtLookup for HickoryTxtLookup {
    fn lookup_txt(&self, name: Name) -> TxtLookupFuture {
        let lookup = self.clone();
        Box::pin(async move {
            let query = name.as_str();
            tracing::debug!(query = %query, "TXT lookup via hickory-dns");

            let answer = match lookup.resolver().txt_lookup(query).await {
                Ok(answer) => answer,
                Err(e) if e.is_no_records_found() || e.is_nx_domain() => {
                    tracing::debug!(query = %query, "no TXT records");
                    return Ok(TxtRecords::new());
                }
                Err(e) => {
                    tracing::debug!(query = %query, error = %e, "hickory-dns TXT lookup failed");
                    return Err(TxtLookupError::Transport(e.to_string()));
                }
            };

            let records: TxtRecords = answer
                .iter()
                .map(|txt| {
                    txt.txt_data()
                        .iter()
                        .map(|chunk| String::from_utf8_lossy(chunk))
                        .collect::<String>()
                })
                .collect();

            tracing::debug!(query = %query, count = records.len(), "TXT lookup complete");
            Ok(records)
        })
    }
}
