//! Shared fixtures for lease manager integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use uuid::Uuid;

use prometheus_lease_manager::config::LeaseManagerConfig;
use prometheus_lease_manager::core::{
    ActiveWorker, Lease, LeaseError, LeaseKind, LeaseManager, LeaseStore, Queue,
    QueueSetReceiver, TenantId, WorkerSetReceiver,
};
use prometheus_lease_manager::infra::InMemoryLeaseStore;

/// Arguments of one acquire-or-extend call.
#[derive(Debug, Clone)]
pub struct AcquireCall {
    pub kind: LeaseKind,
    pub resource_ids: Vec<String>,
    pub existing: Vec<Lease>,
}

/// Wraps a shared in-memory store, recording calls and allowing tests to
/// hold queue listings open, stall acquisitions or fail releases.
pub struct RecordingStore {
    pub inner: Arc<InMemoryLeaseStore>,
    acquire_calls: Mutex<Vec<AcquireCall>>,
    release_calls: Mutex<Vec<Vec<Lease>>>,
    queue_listings: AtomicUsize,
    listing_gate: watch::Sender<bool>,
    pub listing_started: Notify,
    stall_acquire: AtomicBool,
    fail_release: AtomicBool,
}

impl RecordingStore {
    pub fn new(inner: Arc<InMemoryLeaseStore>) -> Self {
        let (listing_gate, _) = watch::channel(true);
        Self {
            inner,
            acquire_calls: Mutex::new(Vec::new()),
            release_calls: Mutex::new(Vec::new()),
            queue_listings: AtomicUsize::new(0),
            listing_gate,
            listing_started: Notify::new(),
            stall_acquire: AtomicBool::new(false),
            fail_release: AtomicBool::new(false),
        }
    }

    pub fn hold_queue_listings(&self) {
        self.listing_gate.send_replace(false);
    }

    pub fn open_queue_listings(&self) {
        self.listing_gate.send_replace(true);
    }

    pub fn stall_acquire(&self, stall: bool) {
        self.stall_acquire.store(stall, Ordering::SeqCst);
    }

    pub fn fail_release(&self, fail: bool) {
        self.fail_release.store(fail, Ordering::SeqCst);
    }

    pub fn acquire_calls(&self) -> Vec<AcquireCall> {
        self.acquire_calls.lock().clone()
    }

    pub fn release_calls(&self) -> Vec<Vec<Lease>> {
        self.release_calls.lock().clone()
    }

    pub fn queue_listings(&self) -> usize {
        self.queue_listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeaseStore for RecordingStore {
    async fn list_queues(&self, tenant_id: TenantId) -> Result<Vec<Queue>, LeaseError> {
        self.queue_listings.fetch_add(1, Ordering::SeqCst);
        self.listing_started.notify_one();

        let mut gate = self.listing_gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        self.inner.list_queues(tenant_id).await
    }

    async fn list_active_workers(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<ActiveWorker>, LeaseError> {
        self.inner.list_active_workers(tenant_id).await
    }

    async fn acquire_or_extend_leases(
        &self,
        tenant_id: TenantId,
        kind: LeaseKind,
        resource_ids: &[String],
        existing_leases: &[Lease],
    ) -> Result<Vec<Lease>, LeaseError> {
        self.acquire_calls.lock().push(AcquireCall {
            kind,
            resource_ids: resource_ids.to_vec(),
            existing: existing_leases.to_vec(),
        });
        if self.stall_acquire.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner
            .acquire_or_extend_leases(tenant_id, kind, resource_ids, existing_leases)
            .await
    }

    async fn release_leases(&self, tenant_id: TenantId, leases: &[Lease]) -> Result<(), LeaseError> {
        self.release_calls.lock().push(leases.to_vec());
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(LeaseError::Store("release transaction aborted".into()));
        }
        self.inner.release_leases(tenant_id, leases).await
    }
}

/// Config with a short tick so loop tests finish quickly.
pub fn fast_config() -> LeaseManagerConfig {
    LeaseManagerConfig::default()
        .with_tick_interval_ms(20)
        .with_lease_duration_ms(5_000)
        .with_store_timeout_ms(1_000)
}

pub fn shared_store(config: &LeaseManagerConfig) -> Arc<InMemoryLeaseStore> {
    Arc::new(InMemoryLeaseStore::new(config.lease_duration()))
}

/// One simulated scheduler instance.
pub struct Instance {
    pub manager: Arc<LeaseManager>,
    pub workers: WorkerSetReceiver,
    pub queues: QueueSetReceiver,
    pub store: Arc<RecordingStore>,
}

pub fn instance(
    config: &LeaseManagerConfig,
    tenant_id: Uuid,
    inner: &Arc<InMemoryLeaseStore>,
) -> Instance {
    let store = Arc::new(RecordingStore::new(Arc::clone(inner)));
    let (manager, workers, queues) =
        LeaseManager::new(config.clone(), tenant_id, Arc::clone(&store) as Arc<dyn LeaseStore>);
    Instance {
        manager,
        workers,
        queues,
        store,
    }
}

pub fn resource_ids(leases: &[Lease]) -> Vec<String> {
    let mut ids: Vec<String> = leases.iter().map(|l| l.resource_id.clone()).collect();
    ids.sort();
    ids
}

/// Give spawned consumers a chance to park on their receiver.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
