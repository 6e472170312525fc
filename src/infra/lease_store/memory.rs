//! In-process lease store enforcing exclusivity and expiry.
//!
//! Every call runs under one `parking_lot::Mutex`, which makes each call
//! atomic. Several managers (one per simulated scheduler instance) can share
//! one store to exercise lease races.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::core::{ActiveWorker, Lease, LeaseError, LeaseKind, LeaseStore, Queue, TenantId};
use crate::util::clock::now_ms;

type LeaseKey = (TenantId, LeaseKind, String);

#[derive(Default)]
struct StoreState {
    last_lease_id: i64,
    queues: HashMap<TenantId, BTreeMap<String, Queue>>,
    workers: HashMap<TenantId, BTreeMap<Uuid, ActiveWorker>>,
    leases: HashMap<LeaseKey, Lease>,
}

impl StoreState {
    fn next_lease_id(&mut self) -> i64 {
        self.last_lease_id += 1;
        self.last_lease_id
    }
}

/// In-memory lease store for development, tests and benchmarks.
pub struct InMemoryLeaseStore {
    lease_duration: Duration,
    available: AtomicBool,
    state: Mutex<StoreState>,
}

impl InMemoryLeaseStore {
    /// Create a store granting leases valid for `lease_duration`.
    pub fn new(lease_duration: Duration) -> Self {
        Self {
            lease_duration,
            available: AtomicBool::new(true),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Register or replace a queue.
    pub fn upsert_queue(&self, tenant_id: TenantId, name: impl Into<String>) {
        let queue = Queue::new(name);
        self.state
            .lock()
            .queues
            .entry(tenant_id)
            .or_default()
            .insert(queue.name.clone(), queue);
    }

    /// Remove a queue. Existing leases on it are left to the managers.
    pub fn remove_queue(&self, tenant_id: TenantId, name: &str) {
        if let Some(queues) = self.state.lock().queues.get_mut(&tenant_id) {
            queues.remove(name);
        }
    }

    /// Mark a worker active, replacing its labels.
    pub fn upsert_worker(&self, tenant_id: TenantId, worker: ActiveWorker) {
        self.state
            .lock()
            .workers
            .entry(tenant_id)
            .or_default()
            .insert(worker.id, worker);
    }

    /// Mark a worker inactive.
    pub fn remove_worker(&self, tenant_id: TenantId, worker_id: Uuid) {
        if let Some(workers) = self.state.lock().workers.get_mut(&tenant_id) {
            workers.remove(&worker_id);
        }
    }

    /// Leases of `kind` that are valid right now, ordered by resource id.
    pub fn valid_leases(&self, tenant_id: TenantId, kind: LeaseKind) -> Vec<Lease> {
        let now = now_ms();
        let mut leases: Vec<Lease> = self
            .state
            .lock()
            .leases
            .values()
            .filter(|l| l.tenant_id == tenant_id && l.kind == kind && l.is_valid_at(now))
            .cloned()
            .collect();
        leases.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));
        leases
    }

    /// Simulate an outage: while unavailable every call fails with
    /// [`LeaseError::Store`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    fn ensure_available(&self) -> Result<(), LeaseError> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(LeaseError::Store("lease store unavailable".into()))
        }
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn list_queues(&self, tenant_id: TenantId) -> Result<Vec<Queue>, LeaseError> {
        self.ensure_available()?;
        Ok(self
            .state
            .lock()
            .queues
            .get(&tenant_id)
            .map(|queues| queues.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_active_workers(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<ActiveWorker>, LeaseError> {
        self.ensure_available()?;
        Ok(self
            .state
            .lock()
            .workers
            .get(&tenant_id)
            .map(|workers| workers.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn acquire_or_extend_leases(
        &self,
        tenant_id: TenantId,
        kind: LeaseKind,
        resource_ids: &[String],
        existing_leases: &[Lease],
    ) -> Result<Vec<Lease>, LeaseError> {
        self.ensure_available()?;

        let now = now_ms();
        let expires_at_ms = now + self.lease_duration.as_millis();
        let caller_lease_ids: HashSet<i64> = existing_leases.iter().map(|l| l.id).collect();

        let mut state = self.state.lock();
        let mut acquired = Vec::with_capacity(resource_ids.len());

        for resource_id in resource_ids {
            let key = (tenant_id, kind, resource_id.clone());

            let current = state
                .leases
                .get(&key)
                .map(|lease| (caller_lease_ids.contains(&lease.id), lease.is_valid_at(now)));

            match current {
                Some((true, _)) => {
                    if let Some(lease) = state.leases.get_mut(&key) {
                        lease.expires_at_ms = expires_at_ms;
                        acquired.push(lease.clone());
                    }
                }
                Some((false, true)) => {
                    // Valid lease owned by someone else.
                }
                _ => {
                    let lease = Lease {
                        id: state.next_lease_id(),
                        tenant_id,
                        kind,
                        resource_id: resource_id.clone(),
                        expires_at_ms,
                    };
                    state.leases.insert(key, lease.clone());
                    acquired.push(lease);
                }
            }
        }

        Ok(acquired)
    }

    async fn release_leases(&self, tenant_id: TenantId, leases: &[Lease]) -> Result<(), LeaseError> {
        self.ensure_available()?;

        let ids: HashSet<i64> = leases.iter().map(|l| l.id).collect();
        self.state
            .lock()
            .leases
            .retain(|(tenant, _, _), lease| !(*tenant == tenant_id && ids.contains(&lease.id)));
        Ok(())
    }
}
