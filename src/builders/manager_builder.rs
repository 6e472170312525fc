//! Builders to construct one lease manager per tenant.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::LeaseManagerConfig;
use crate::core::{LeaseError, LeaseManager, LeaseStore, QueueSetReceiver, TenantId, WorkerSetReceiver};

/// A tenant's manager together with the streams its consumers read.
pub struct TenantLeaseManager {
    /// The tenant's lease manager.
    pub manager: Arc<LeaseManager>,
    /// Workers currently leased by this instance.
    pub workers: WorkerSetReceiver,
    /// Queues currently leased by this instance.
    pub queues: QueueSetReceiver,
}

/// Build independent lease managers for `tenants`, obtaining each tenant's
/// store from `store_factory`. Duplicate tenant ids collapse into one manager.
pub fn build_lease_managers<F>(
    cfg: &LeaseManagerConfig,
    tenants: &[TenantId],
    mut store_factory: F,
) -> Result<HashMap<TenantId, TenantLeaseManager>, LeaseError>
where
    F: FnMut(TenantId, &LeaseManagerConfig) -> Result<Arc<dyn LeaseStore>, LeaseError>,
{
    cfg.validate().map_err(LeaseError::InvalidConfig)?;

    let mut managers = HashMap::with_capacity(tenants.len());
    for &tenant_id in tenants {
        if managers.contains_key(&tenant_id) {
            continue;
        }
        let store = store_factory(tenant_id, cfg)?;
        let (manager, workers, queues) = LeaseManager::new(cfg.clone(), tenant_id, store);
        managers.insert(
            tenant_id,
            TenantLeaseManager {
                manager,
                workers,
                queues,
            },
        );
    }

    tracing::debug!(tenants = managers.len(), "built lease managers");
    Ok(managers)
}
