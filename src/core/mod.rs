//! Lease domain types, the diff engine, broadcast layer and lease manager.

pub mod broadcast;
pub mod diff;
pub mod error;
pub mod lease;
pub mod lease_manager;
pub mod lease_store;

pub use broadcast::{Broadcaster, Delivery, ResourceSetReceiver};
pub use diff::{diff_leases, LeaseDiff};
pub use error::{AppResult, LeaseError};
pub use lease::{ActiveWorker, Lease, LeaseKind, Queue, TenantId, WorkerLabel};
pub use lease_manager::{LeaseManager, QueueSetReceiver, Spawn, WorkerSetReceiver};
pub use lease_store::LeaseStore;
