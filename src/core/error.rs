//! Error types for lease operations.

use thiserror::Error;

/// Errors produced by the lease store and the lease manager.
///
/// Losing a lease race to another scheduler instance is not an error: the
/// store simply omits the resource from its result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaseError {
    /// Connectivity or transaction failure in the backing store.
    #[error("store error: {0}")]
    Store(String),
    /// A store call did not finish within the configured store timeout.
    #[error("store operation `{operation}` timed out after {after_ms}ms")]
    Timeout {
        /// Store operation that was abandoned.
        operation: &'static str,
        /// Timeout that elapsed, in milliseconds.
        after_ms: u64,
    },
    /// Configuration rejected during validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
