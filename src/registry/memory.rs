use super::{Lookup, Tenant, TenantRegistry};
use crate::base::error::ResolveError;
use crate::base::identifier::TenantIdentifier;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;

/// Thread-safe in-memory registry.
///
/// Usually filled once at startup; `insert` and `remove` stay available for
/// hosts that provision tenants at runtime.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTenantRegistry {
    tenants: Arc<DashMap<TenantIdentifier, Tenant>>,
}

impl InMemoryTenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON array of tenant records.
    pub fn from_json_str(json: &str) -> Result<Self, ResolveError> {
        let tenants: Vec<Tenant> = serde_json::from_str(json)?;
        Ok(tenants.into_iter().collect())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ResolveError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Adds or replaces a record; returns the previous one.
    pub fn insert(&self, tenant: Tenant) -> Option<Tenant> {
        self.tenants.insert(tenant.identifier.clone(), tenant)
    }

    pub fn remove(&self, identifier: &TenantIdentifier) -> Option<Tenant> {
        self.tenants.remove(identifier).map(|(_, tenant)| tenant)
    }

    pub fn get(&self, identifier: &TenantIdentifier) -> Option<Tenant> {
        self.tenants.get(identifier).map(|t| t.value().clone())
    }

    pub fn contains(&self, identifier: &TenantIdentifier) -> bool {
        self.tenants.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

impl FromIterator<Tenant> for InMemoryTenantRegistry {
    fn from_iter<I: IntoIterator<Item = Tenant>>(iter: I) -> Self {
        let registry = Self::new();
        for tenant in iter {
            registry.insert(tenant);
        }
        registry
    }
}

impl TenantRegistry for InMemoryTenantRegistry {
    fn lookup<'a>(&'a self, identifier: &'a TenantIdentifier) -> Lookup<'a> {
        Box::pin(std::future::ready(self.get(identifier)))
    }
}
