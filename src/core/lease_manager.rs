//! Tenant-scoped lease manager.
//!
//! The manager decides, once per tick, which workers and queues this scheduler
//! instance may act on. Each kind has its own exclusive section guarding the
//! held-lease cache: periodic passes try-lock it and skip when busy, cleanup
//! waits for it so shutdown never races a live pass.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::LeaseManagerConfig;
use crate::core::{
    diff_leases, ActiveWorker, Broadcaster, Delivery, Lease, LeaseError, LeaseKind, LeaseStore,
    ResourceSetReceiver, TenantId,
};

/// Abstraction for spawning background work on a runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Stream of workers this instance currently holds leases on.
pub type WorkerSetReceiver = ResourceSetReceiver<Vec<ActiveWorker>>;
/// Stream of queue names this instance currently holds leases on.
pub type QueueSetReceiver = ResourceSetReceiver<Vec<String>>;

/// Holds leases on workers and queues for one tenant and tells downstream
/// consumers which ones are currently theirs.
pub struct LeaseManager {
    tenant_id: TenantId,
    config: LeaseManagerConfig,
    store: Arc<dyn LeaseStore>,

    worker_leases: Mutex<Vec<Lease>>,
    queue_leases: Mutex<Vec<Lease>>,

    broadcaster: Broadcaster,
    /// Stops the periodic loop once cleanup begins.
    shutdown: CancellationToken,
}

impl LeaseManager {
    /// Create a manager for `tenant_id` together with the worker and queue
    /// streams its consumers subscribe to.
    pub fn new(
        config: LeaseManagerConfig,
        tenant_id: TenantId,
        store: Arc<dyn LeaseStore>,
    ) -> (Arc<Self>, WorkerSetReceiver, QueueSetReceiver) {
        let (broadcaster, workers_rx, queues_rx) = Broadcaster::new(tenant_id);

        let manager = Arc::new(Self {
            tenant_id,
            config,
            store,
            worker_leases: Mutex::new(Vec::new()),
            queue_leases: Mutex::new(Vec::new()),
            broadcaster,
            shutdown: CancellationToken::new(),
        });

        (manager, workers_rx, queues_rx)
    }

    /// Tenant this manager is scoped to.
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Configuration in use.
    pub const fn config(&self) -> &LeaseManagerConfig {
        &self.config
    }

    /// Whether cleanup has started.
    pub fn is_closed(&self) -> bool {
        !self.broadcaster.is_open()
    }

    /// Snapshot of the leases this instance believes it holds for `kind`.
    /// Waits for an in-flight pass of that kind to finish.
    pub async fn held_leases(&self, kind: LeaseKind) -> Vec<Lease> {
        self.leases_for(kind).lock().await.clone()
    }

    /// Run one worker reconciliation pass.
    ///
    /// Returns immediately with `Ok(())` if a worker pass is already running
    /// or shutdown has begun. A failed listing or acquire leaves the held-lease
    /// cache untouched; a failed release keeps the departed leases cached
    /// alongside the ones just acquired, and nothing is published.
    pub async fn reconcile_workers(&self) -> Result<(), LeaseError> {
        let Ok(mut held) = self.worker_leases.try_lock() else {
            tracing::debug!(tenant_id = %self.tenant_id, "worker reconciliation in flight, skipping");
            return Ok(());
        };
        if self.is_closed() {
            return Ok(());
        }

        let workers = self
            .call_store(
                "list_active_workers",
                self.store.list_active_workers(self.tenant_id),
            )
            .await?;

        let listed: Vec<String> = workers.iter().map(ActiveWorker::resource_id).collect();
        let mut by_id: HashMap<String, ActiveWorker> = listed.iter().cloned().zip(workers).collect();

        self.reconcile_kind(LeaseKind::Worker, &mut held, &listed)
            .await?;

        let held_workers = held
            .iter()
            .filter_map(|lease| by_id.remove(&lease.resource_id))
            .collect();
        let delivery = self.broadcaster.publish_workers(held_workers);
        self.log_delivery(LeaseKind::Worker, delivery);

        Ok(())
    }

    /// Run one queue reconciliation pass. Same contract as
    /// [`reconcile_workers`](Self::reconcile_workers).
    pub async fn reconcile_queues(&self) -> Result<(), LeaseError> {
        let Ok(mut held) = self.queue_leases.try_lock() else {
            tracing::debug!(tenant_id = %self.tenant_id, "queue reconciliation in flight, skipping");
            return Ok(());
        };
        if self.is_closed() {
            return Ok(());
        }

        let queues = self
            .call_store("list_queues", self.store.list_queues(self.tenant_id))
            .await?;
        let listed: Vec<String> = queues.into_iter().map(|q| q.name).collect();

        self.reconcile_kind(LeaseKind::Queue, &mut held, &listed)
            .await?;

        let held_queues = held.iter().map(|lease| lease.resource_id.clone()).collect();
        let delivery = self.broadcaster.publish_queues(held_queues);
        self.log_delivery(LeaseKind::Queue, delivery);

        Ok(())
    }

    /// Begin periodic reconciliation on `spawner`. Returns immediately; the
    /// loop stops when `cancel` fires or cleanup begins. Passes already
    /// running when that happens are allowed to finish.
    pub fn start<S: Spawn>(self: &Arc<Self>, spawner: &S, cancel: CancellationToken) {
        let manager = Arc::clone(self);
        spawner.spawn(async move { manager.run(cancel).await });
    }

    /// Release every held lease and close both resource streams.
    ///
    /// Runs once; later calls return `Ok(())` without doing anything. Waits
    /// for in-flight passes before releasing. If releasing either kind fails
    /// the streams are still closed and the first error is returned.
    pub async fn cleanup(&self) -> Result<(), LeaseError> {
        if !self.broadcaster.begin_close() {
            return Ok(());
        }
        self.shutdown.cancel();

        tracing::info!(tenant_id = %self.tenant_id, "releasing held leases");

        let (workers, queues) = tokio::join!(
            self.release_all(LeaseKind::Worker),
            self.release_all(LeaseKind::Queue),
        );

        self.broadcaster.finish_close();

        workers.and(queues)
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let period = self.config.tick_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            tenant_id = %self.tenant_id,
            tick_ms = self.config.tick_interval_ms,
            "lease loop started"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = self.shutdown.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }

        tracing::info!(tenant_id = %self.tenant_id, "lease loop stopped");
    }

    async fn tick(&self) {
        let (workers, queues) = tokio::join!(self.reconcile_workers(), self.reconcile_queues());

        if let Err(err) = workers {
            tracing::error!(tenant_id = %self.tenant_id, error = %err, "error acquiring worker leases");
        }
        if let Err(err) = queues {
            tracing::error!(tenant_id = %self.tenant_id, error = %err, "error acquiring queue leases");
        }
    }

    /// Shared body of a reconciliation pass. `held` changes only after a
    /// successful acquire, and loses a lease only after a successful release.
    async fn reconcile_kind(
        &self,
        kind: LeaseKind,
        held: &mut Vec<Lease>,
        listed: &[String],
    ) -> Result<(), LeaseError> {
        let diff = diff_leases(listed, held.as_slice());

        let acquired = if diff.resource_ids.is_empty() {
            Vec::new()
        } else {
            self.call_store(
                "acquire_or_extend_leases",
                self.store.acquire_or_extend_leases(
                    self.tenant_id,
                    kind,
                    &diff.resource_ids,
                    &diff.to_extend,
                ),
            )
            .await?
        };

        if acquired.len() < diff.resource_ids.len() {
            let won: HashSet<&str> = acquired.iter().map(|l| l.resource_id.as_str()).collect();
            let lost: Vec<&str> = diff
                .resource_ids
                .iter()
                .map(String::as_str)
                .filter(|id| !won.contains(id))
                .collect();
            tracing::debug!(
                tenant_id = %self.tenant_id,
                %kind,
                ?lost,
                "resources leased by another instance"
            );
        }

        // Everything the acquire granted is ours now. Departed leases stay in
        // the cache until the store confirms their release.
        *held = acquired;
        if diff.to_release.is_empty() {
            return Ok(());
        }
        held.extend(diff.to_release.iter().cloned());

        self.call_store(
            "release_leases",
            self.store.release_leases(self.tenant_id, &diff.to_release),
        )
        .await?;

        let released: HashSet<i64> = diff.to_release.iter().map(|l| l.id).collect();
        held.retain(|lease| !released.contains(&lease.id));
        tracing::debug!(
            tenant_id = %self.tenant_id,
            %kind,
            released = released.len(),
            "released leases on departed resources"
        );
        Ok(())
    }

    fn log_delivery(&self, kind: LeaseKind, delivery: Delivery) {
        match delivery {
            Delivery::Delivered => {
                tracing::trace!(tenant_id = %self.tenant_id, %kind, "published held set");
            }
            Delivery::Dropped => {
                tracing::trace!(tenant_id = %self.tenant_id, %kind, "held set not taken, consumer keeps previous snapshot");
            }
            Delivery::Closed => {}
        }
    }

    async fn release_all(&self, kind: LeaseKind) -> Result<(), LeaseError> {
        let mut held = self.leases_for(kind).lock().await;
        if held.is_empty() {
            return Ok(());
        }

        match self
            .call_store(
                "release_leases",
                self.store.release_leases(self.tenant_id, held.as_slice()),
            )
            .await
        {
            Ok(()) => {
                tracing::info!(tenant_id = %self.tenant_id, %kind, count = held.len(), "released leases");
                held.clear();
                Ok(())
            }
            Err(err) => {
                tracing::error!(tenant_id = %self.tenant_id, %kind, error = %err, "failed to release leases");
                Err(err)
            }
        }
    }

    async fn call_store<T, F>(&self, operation: &'static str, call: F) -> Result<T, LeaseError>
    where
        F: Future<Output = Result<T, LeaseError>>,
    {
        tokio::time::timeout(self.config.store_timeout(), call)
            .await
            .unwrap_or(Err(LeaseError::Timeout {
                operation,
                after_ms: self.config.store_timeout_ms,
            }))
    }

    const fn leases_for(&self, kind: LeaseKind) -> &Mutex<Vec<Lease>> {
        match kind {
            LeaseKind::Worker => &self.worker_leases,
            LeaseKind::Queue => &self.queue_leases,
        }
    }
}
