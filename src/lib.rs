//! # Prometheus Lease Manager
//!
//! A tenant-scoped distributed lease manager for multi-instance job schedulers.
//!
//! Many scheduler processes compete for the same workers and queues. Before a
//! scheduler dispatches work to a resource it must hold a time-bounded,
//! renewable lease on it, so that exactly the instances holding valid leases
//! treat a resource as theirs. A crashed or partitioned instance simply stops
//! renewing, its leases expire, and other instances pick the resources up.
//!
//! ## How It Works
//!
//! On a fixed cadence the [`LeaseManager`](core::LeaseManager) runs one
//! reconciliation pass per resource kind:
//!
//! 1. List live resources (active workers or queues) from the [`LeaseStore`](core::LeaseStore)
//! 2. Diff the listing against the leases it already holds
//! 3. Acquire-or-extend leases on everything listed, in one atomic call
//! 4. Release leases on resources that disappeared
//! 5. Publish the resulting set to the downstream consumer for that kind
//!
//! Passes for one kind never overlap: a tick arriving while a pass is running
//! is dropped. Publishing is latest-wins and never blocks; consumers must
//! treat the absence of a resource in the latest set as "stop dispatching to it".
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_lease_manager::config::LeaseManagerConfig;
//! use prometheus_lease_manager::core::LeaseManager;
//! use prometheus_lease_manager::infra::InMemoryLeaseStore;
//! use prometheus_lease_manager::runtime::TokioSpawner;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = LeaseManagerConfig::from_env()?;
//! let store = Arc::new(InMemoryLeaseStore::new(config.lease_duration()));
//! let (manager, workers, queues) = LeaseManager::new(config, tenant_id, store);
//!
//! let cancel = CancellationToken::new();
//! manager.start(&TokioSpawner::current(), cancel.clone());
//!
//! while let Some(queue_names) = queues.recv().await {
//!     // dispatch only to `queue_names`
//! }
//!
//! // on shutdown
//! cancel.cancel();
//! manager.cleanup().await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Lease domain types, diffing, broadcast and the lease manager.
pub mod core;
/// Configuration models for lease managers.
pub mod config;
/// Builders to construct per-tenant managers from configuration.
pub mod builders;
/// Infrastructure adapters for lease storage backends.
pub mod infra;
/// Runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
