//! Store port consumed by the lease manager.

use async_trait::async_trait;

use crate::core::{ActiveWorker, Lease, LeaseError, LeaseKind, Queue, TenantId};

/// Transactional boundary over the persistent lease store.
///
/// Implementations must apply each call all-or-nothing and report
/// connectivity or transaction failures as [`LeaseError::Store`].
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Snapshot of the tenant's queues.
    async fn list_queues(&self, tenant_id: TenantId) -> Result<Vec<Queue>, LeaseError>;

    /// Snapshot of the tenant's active workers with their labels.
    async fn list_active_workers(&self, tenant_id: TenantId)
        -> Result<Vec<ActiveWorker>, LeaseError>;

    /// Acquire or extend leases on `resource_ids` in one atomic operation.
    ///
    /// A resource referenced by one of `existing_leases` has that lease
    /// extended with its identity preserved; any other resource gets a new
    /// lease if nobody else holds a valid one. Only leases the caller now
    /// validly holds are returned; resources lost to another holder are
    /// omitted rather than reported as errors.
    async fn acquire_or_extend_leases(
        &self,
        tenant_id: TenantId,
        kind: LeaseKind,
        resource_ids: &[String],
        existing_leases: &[Lease],
    ) -> Result<Vec<Lease>, LeaseError>;

    /// Release leases in bulk. Expired or foreign leases are ignored.
    async fn release_leases(&self, tenant_id: TenantId, leases: &[Lease]) -> Result<(), LeaseError>;
}
