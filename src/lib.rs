//! # tenantchain
//!
//! Per-request tenant resolution for multi-tenant services.
//!
//! `tenantchain` decides which tenant an inbound request belongs to. It runs
//! an ordered chain of independent strategies and reconciles their answers,
//! either first-match-wins or strict consensus.
//!
//! ## Features
//!
//! - **Strategies**: subdomain, path segment, header, query parameter, exact
//!   domain map, hybrid (domain map plus wildcard subdomain patterns) and
//!   DNS TXT records (`_tenant.<host>`)
//! - **Strict mode**: disagreeing strategies surface an ambiguity error with
//!   full diagnostics instead of a silent tie-break
//! - **Header allow-list**: only explicitly trusted headers may name a tenant
//! - **DNS cache**: TTL-bounded, shared across requests, negative answers included
//! - **Diagnostics**: per-request record of what every strategy said
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tenantchain::{ChainConfig, ChainResolver, TenantRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tenantchain::ResolveError> {
//!     let config = ChainConfig::from_json_str(r#"{
//!         "order": ["header", "subdomain"],
//!         "subdomain": { "base_domain": "example.com" }
//!     }"#)?;
//!     let resolver = ChainResolver::from_config(&config)?;
//!
//!     let request = TenantRequest::new("acme.example.com:8443");
//!     let resolution = resolver.resolve(&request).await?;
//!     println!("{}", resolution.diagnostics().render());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Identifiers, the request view and error definitions
//! - [`strategy`] - The `Strategy` trait and the built-in strategies
//! - [`chain`] - Chain configuration, the resolver and diagnostics
//! - [`dns`] - TXT lookups and the DNS answer cache
//! - [`security`] - Header allow-list
//! - [`registry`] - Tenant records and registry lookup

pub mod base;
pub mod chain;
pub mod dns;
pub mod registry;
pub mod security;
pub mod strategy;

pub use base::error::{FailureReason, ResolveError};
pub use base::identifier::TenantIdentifier;
pub use base::request::TenantRequest;
pub use chain::{ChainConfig, ChainResolver, DiagnosticRecord, Resolution};
pub use registry::{Tenant, TenantRegistry, TenantResolver};
pub use strategy::{ResolutionOutcome, Strategy};
