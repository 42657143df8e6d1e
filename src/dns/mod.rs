//! DNS TXT lookups and their cache.
//!
//! Provides pluggable TXT record lookups for the DNS-TXT strategy:
//! - [`HickoryTxtLookup`]: async hickory-dns resolver using system configuration
//! - [`TxtLookupWithOverrides`]: static name-to-records table in front of another lookup
//! - [`DnsCache`]: process-wide, TTL-bounded answer cache
//!
//! # Architecture
//!
//! [`TxtLookup`] is the seam between tenant resolution and the network.
//! The strategy owns the timeout; lookups only report what the resolver
//! said: records, an empty answer, or a transport failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use tenantchain::dns::{HickoryTxtLookup, Name, TxtLookup};
//!
//! let lookup = HickoryTxtLookup::default();
//! let records = lookup.lookup_txt(Name::new("_tenant.acme.com")).await?;
//! ```

mod cache;
mod hickory;
mod lookup;

pub use cache::{DnsCache, DEFAULT_CACHE_TTL};
pub use hickory::{HickoryTxtLookup, DEFAULT_LOOKUP_TIMEOUT};
pub use lookup::{
    Name, TxtLookup, TxtLookupError, TxtLookupFuture, TxtLookupWithOverrides, TxtRecords,
    TXT_RECORD_PREFIX,
};
