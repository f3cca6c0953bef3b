//! Configuration Tests.
//!
//! Verifies defaults, JSON deserialization, and validation rejections.

use llc_core::config::{Config, PolicyKind};

/// The default configuration is valid and selects Hawkeye.
#[test]
fn defaults_are_valid() {
    let config = Config::default();
    config.validate().unwrap();
    assert_eq!(config.policy, PolicyKind::Hawkeye);
    assert_eq!(config.cache.num_sets, 2048);
    assert_eq!(config.cache.num_ways, 16);
    assert_eq!(config.hawkeye.num_rrpv_bits, 3);
    assert_eq!(config.mockingjay.num_etr_bits, 4);
}

/// Partial JSON overrides merge over the defaults.
#[test]
fn partial_json_overrides() {
    let json = r#"{
        "cache": { "num_sets": 1024, "num_cpus": 4 },
        "policy": "mockingjay",
        "mockingjay": { "num_clock_bits": 4 }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    config.validate().unwrap();
    assert_eq!(config.policy, PolicyKind::Mockingjay);
    assert_eq!(config.cache.num_sets, 1024);
    assert_eq!(config.cache.num_cpus, 4);
    assert_eq!(config.cache.num_ways, 16, "unspecified fields keep defaults");
    assert_eq!(config.mockingjay.num_clock_bits, 4);
    assert_eq!(config.mockingjay.num_etr_bits, 4);
}

/// Non-power-of-two geometry is rejected.
#[test]
fn rejects_bad_geometry() {
    let json = r#"{ "cache": { "num_sets": 1000 } }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("num_sets"));
}

/// Counter widths outside their backing types are rejected.
#[test]
fn rejects_bad_widths() {
    let json = r#"{ "hawkeye": { "num_rrpv_bits": 12 } }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert!(config.validate().is_err());

    let json = r#"{ "mockingjay": { "num_etr_bits": 1 } }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert!(config.validate().is_err());
}

/// More sampled sets than cache sets is inconsistent.
#[test]
fn rejects_oversampling() {
    let json = r#"{
        "cache": { "num_sets": 32 },
        "hawkeye": { "num_sampled_sets": 64 }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert!(config.validate().is_err());
}
