//! Builders to construct lease managers from configuration.

pub mod manager_builder;

pub use manager_builder::{build_lease_managers, TenantLeaseManager};
