//! Tests for configuration validation

use prometheus_lease_manager::config::LeaseManagerConfig;

#[test]
fn test_default_config() {
    let config = LeaseManagerConfig::default();
    assert_eq!(config.tick_interval_ms, 1_000);
    assert_eq!(config.lease_duration_ms, 30_000);
    assert_eq!(config.store_timeout_ms, 5_000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_tick_interval_rejected() {
    let config = LeaseManagerConfig::default().with_tick_interval_ms(0);
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_store_timeout_rejected() {
    let config = LeaseManagerConfig::default().with_store_timeout_ms(0);
    assert!(config.validate().is_err());
}

#[test]
fn test_lease_shorter_than_tick_rejected() {
    let config = LeaseManagerConfig::default()
        .with_tick_interval_ms(2_000)
        .with_lease_duration_ms(1_500);
    let err = config.validate().unwrap_err();
    assert!(err.contains("must exceed"));
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "tick_interval_ms": 500,
        "lease_duration_ms": 10000,
        "store_timeout_ms": 2000
    }"#;

    let config = LeaseManagerConfig::from_json_str(json).unwrap();
    assert_eq!(config.tick_interval_ms, 500);
    assert_eq!(config.lease_duration_ms, 10_000);
    assert_eq!(config.store_timeout_ms, 2_000);
}

#[test]
fn test_partial_json_uses_defaults() {
    let config = LeaseManagerConfig::from_json_str(r#"{ "tick_interval_ms": 250 }"#).unwrap();
    assert_eq!(config.tick_interval_ms, 250);
    assert_eq!(config.lease_duration_ms, 30_000);
}

#[test]
fn test_invalid_json_rejected() {
    let err = LeaseManagerConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));

    let err = LeaseManagerConfig::from_json_str(r#"{ "lease_duration_ms": 0 }"#).unwrap_err();
    assert!(err.contains("lease_duration_ms"));
}
