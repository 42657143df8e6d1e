use super::{Tenant, TenantRegistry};
use crate::base::error::ResolveError;
use crate::base::identifier::TenantIdentifier;
use crate::base::request::TenantRequest;
use crate::chain::{ChainResolver, Resolution};
use std::sync::Arc;

/// Resolves a request all the way to a [`Tenant`] record.
///
/// Runs the chain, then looks the identifier up in the registry. Whether a
/// missing tenant is fatal is the caller's choice: [`resolve`](Self::resolve)
/// reports it as `None`, [`require`](Self::require) as an error.
#[derive(Clone)]
pub struct TenantResolver {
    chain: Arc<ChainResolver>,
    registry: Arc<dyn TenantRegistry>,
}

impl TenantResolver {
    pub fn new(chain: Arc<ChainResolver>, registry: Arc<dyn TenantRegistry>) -> Self {
        Self { chain, registry }
    }

    pub fn chain(&self) -> &ChainResolver {
        &self.chain
    }

    /// `Ok(None)` when the chain found no tenant.
    ///
    /// An identifier the registry does not know is
    /// [`ResolveError::TenantNotFound`]: the request named a tenant, just not
    /// one that exists.
    pub async fn resolve(&self, request: &TenantRequest) -> Result<Option<Tenant>, ResolveError> {
        match self.chain.resolve(request).await? {
            Resolution::Resolved { identifier, .. } => self.materialize(identifier).await.map(Some),
            Resolution::NoTenant { .. } => Ok(None),
        }
    }

    /// Like [`resolve`](Self::resolve), but a request without a tenant is
    /// [`ResolveError::ResolutionFailed`].
    pub async fn require(&self, request: &TenantRequest) -> Result<Tenant, ResolveError> {
        let identifier = self.chain.resolve(request).await?.require_tenant()?;
        self.materialize(identifier).await
    }

    async fn materialize(&self, identifier: TenantIdentifier) -> Result<Tenant, ResolveError> {
        match self.registry.lookup(&identifier).await {
            Some(tenant) => Ok(tenant),
            None => {
                tracing::debug!(tenant = %identifier, "Resolved tenant has no registry record");
                Err(ResolveError::TenantNotFound {
                    identifier: identifier.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for TenantResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantResolver")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}
