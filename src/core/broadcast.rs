//! Latest-wins, non-blocking fan-out of held resource sets.
//!
//! Each kind has one rendezvous channel (`flume::bounded(0)`). A publish
//! hands the set over only if a consumer is parked in [`ResourceSetReceiver::recv`];
//! otherwise the set is dropped and the consumer keeps its previous snapshot
//! until the next successful publish. Publishing never blocks and never fails.
//!
//! Both senders share one shutdown guard so that publishes and the close
//! performed by cleanup never interleave.

use flume::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use crate::core::{ActiveWorker, LeaseKind, TenantId};

/// Outcome of a single publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A waiting consumer received the set.
    Delivered,
    /// No consumer was ready, or the consumer went away; the set was dropped.
    Dropped,
    /// Shutdown has begun; nothing was sent.
    Closed,
}

/// Read side of a resource-set stream handed to downstream consumers.
///
/// `None` from [`recv`](Self::recv) means end-of-stream: the manager was
/// cleaned up and the consumer no longer owns anything.
#[derive(Debug)]
pub struct ResourceSetReceiver<T> {
    rx: Receiver<T>,
}

impl<T> ResourceSetReceiver<T> {
    /// Wait for the next published set.
    pub async fn recv(&self) -> Option<T> {
        self.rx.recv_async().await.ok()
    }

    /// Blocking variant of [`recv`](Self::recv) for consumers on dedicated threads.
    pub fn recv_blocking(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Take a set only if one is already waiting.
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Whether the publishing side has been closed.
    pub fn is_closed(&self) -> bool {
        self.rx.is_disconnected()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Closing,
    Closed,
}

struct Sinks {
    phase: Phase,
    workers: Option<Sender<Vec<ActiveWorker>>>,
    queues: Option<Sender<Vec<String>>>,
}

/// Publishing side for both resource kinds of one tenant.
pub struct Broadcaster {
    tenant_id: TenantId,
    sinks: Mutex<Sinks>,
}

impl Broadcaster {
    /// Create the broadcaster and the two consumer streams (workers, queues).
    pub fn new(
        tenant_id: TenantId,
    ) -> (
        Self,
        ResourceSetReceiver<Vec<ActiveWorker>>,
        ResourceSetReceiver<Vec<String>>,
    ) {
        let (workers_tx, workers_rx) = flume::bounded(0);
        let (queues_tx, queues_rx) = flume::bounded(0);

        let broadcaster = Self {
            tenant_id,
            sinks: Mutex::new(Sinks {
                phase: Phase::Open,
                workers: Some(workers_tx),
                queues: Some(queues_tx),
            }),
        };

        (
            broadcaster,
            ResourceSetReceiver { rx: workers_rx },
            ResourceSetReceiver { rx: queues_rx },
        )
    }

    /// Offer the currently held workers to the worker consumer.
    #[must_use]
    pub fn publish_workers(&self, workers: Vec<ActiveWorker>) -> Delivery {
        let sinks = self.sinks.lock();
        if sinks.phase != Phase::Open {
            return Delivery::Closed;
        }
        self.offer(sinks.workers.as_ref(), LeaseKind::Worker, workers)
    }

    /// Offer the currently held queue names to the queue consumer.
    #[must_use]
    pub fn publish_queues(&self, queues: Vec<String>) -> Delivery {
        let sinks = self.sinks.lock();
        if sinks.phase != Phase::Open {
            return Delivery::Closed;
        }
        self.offer(sinks.queues.as_ref(), LeaseKind::Queue, queues)
    }

    /// Whether shutdown has not yet begun.
    pub fn is_open(&self) -> bool {
        self.sinks.lock().phase == Phase::Open
    }

    /// Move from open to closing. Returns `false` if shutdown was already
    /// started by someone else, in which case the caller must not close again.
    pub fn begin_close(&self) -> bool {
        let mut sinks = self.sinks.lock();
        if sinks.phase != Phase::Open {
            return false;
        }
        sinks.phase = Phase::Closing;
        true
    }

    /// Drop both senders so consumers observe end-of-stream.
    pub fn finish_close(&self) {
        let mut sinks = self.sinks.lock();
        sinks.phase = Phase::Closed;
        sinks.workers = None;
        sinks.queues = None;
        tracing::debug!(tenant_id = %self.tenant_id, "resource streams closed");
    }

    fn offer<T>(&self, sender: Option<&Sender<T>>, kind: LeaseKind, set: T) -> Delivery {
        let Some(sender) = sender else {
            return Delivery::Closed;
        };

        match sender.try_send(set) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => Delivery::Dropped,
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!(tenant_id = %self.tenant_id, %kind, "resource consumer disconnected, dropping update");
                Delivery::Dropped
            }
        }
    }
}
