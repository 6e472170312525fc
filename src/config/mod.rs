//! Configuration models for lease managers.

pub mod lease;

pub use lease::LeaseManagerConfig;
