//! Trust controls for request-supplied tenant hints.

pub mod allowlist;

pub use allowlist::{HeaderAllowList, DEFAULT_ALLOWED_HEADERS};
