//! Tenant records and the registry the resolved identifier is looked up in.
//!
//! The registry is a collaborator: hosts back [`TenantRegistry`] with their
//! own store. [`InMemoryTenantRegistry`] covers static deployments and tests.

mod memory;
mod resolver;

pub use memory::InMemoryTenantRegistry;
pub use resolver::TenantResolver;

use crate::base::identifier::TenantIdentifier;
use serde::{Deserialize, Serialize};
use std::{future::Future, pin::Pin, sync::Arc};

/// A tenant record as handed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub identifier: TenantIdentifier,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Tenant {
    pub fn new(identifier: TenantIdentifier, name: impl Into<String>) -> Self {
        Self {
            identifier,
            name: name.into(),
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Alias for the future returned by [`TenantRegistry::lookup`].
pub type Lookup<'a> = Pin<Box<dyn Future<Output = Option<Tenant>> + Send + 'a>>;

/// Looks tenant records up by identifier.
pub trait TenantRegistry: Send + Sync {
    /// `None` when no record exists.
    fn lookup<'a>(&'a self, identifier: &'a TenantIdentifier) -> Lookup<'a>;
}

impl<R: TenantRegistry + ?Sized> TenantRegistry for Arc<R> {
    fn lookup<'a>(&'a self, identifier: &'a TenantIdentifier) -> Lookup<'a> {
        (**self).lookup(identifier)
    }
}
