//! Infrastructure adapters for lease storage backends.

pub mod lease_store;

pub use lease_store::InMemoryLeaseStore;
