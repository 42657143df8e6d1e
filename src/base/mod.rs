//! Base types and error handling.
//!
//! - [`ResolveError`](error::ResolveError): configuration and chain-level errors
//! - [`TenantIdentifier`](identifier::TenantIdentifier): validated tenant slug
//! - [`TenantRequest`](request::TenantRequest): read-only request view

pub mod error;
pub mod identifier;
pub mod request;
