//! Tests for error types

use prometheus_lease_manager::core::LeaseError;

#[test]
fn test_store_error() {
    let err = LeaseError::Store("connection refused".to_string());
    assert_eq!(format!("{}", err), "store error: connection refused");
}

#[test]
fn test_timeout_error() {
    let err = LeaseError::Timeout {
        operation: "release_leases",
        after_ms: 5000,
    };
    assert_eq!(
        format!("{}", err),
        "store operation `release_leases` timed out after 5000ms"
    );
}

#[test]
fn test_invalid_config_error() {
    let err = LeaseError::InvalidConfig("tick_interval_ms must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: tick_interval_ms must be greater than 0"
    );
}
