//! The chain resolver: ordered strategies plus a consensus policy.
//!
//! - [`ChainConfig`]: `resolver_chain` configuration, loaded once at startup
//! - [`ChainResolver`]: runs the strategies and decides
//! - [`DiagnosticRecord`]: what every strategy said, and why the chain decided as it did
//!
//! # Example
//!
//! ```rust,ignore
//! use tenantchain::chain::{ChainConfig, ChainResolver};
//! use tenantchain::TenantRequest;
//!
//! let config = ChainConfig::from_json_file("tenancy.json")?;
//! let resolver = ChainResolver::from_config(&config)?;
//!
//! let request = TenantRequest::new("acme.example.com").with_path("/dashboard");
//! match resolver.resolve(&request).await?.identifier() {
//!     Some(tenant) => println!("tenant: {tenant}"),
//!     None => println!("no tenant"),
//! }
//! ```

pub mod config;
pub mod diagnostics;
mod resolver;

pub use config::{ChainConfig, DnsTxtConfig, HybridConfig, PatternStrategy, SubdomainPatternConfig};
pub use diagnostics::{
    Decision, DiagnosticEntry, DiagnosticRecord, DiagnosticsSink, TracingDiagnostics,
};
pub use resolver::{ChainResolver, Resolution};
