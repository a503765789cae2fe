//! Tests for configuration validation

use std::time::Duration;

use throttled_dispatch::config::{DispatcherConfig, SchedulerConfig};

fn config(max_concurrent: u32, requests_per_second: u32, window_ms: u64) -> DispatcherConfig {
    DispatcherConfig {
        max_concurrent,
        requests_per_second,
        window_ms,
    }
}

#[test]
fn test_dispatcher_config_validation() {
    assert!(config(2, 5, 1000).validate().is_ok());
}

#[test]
fn test_dispatcher_config_invalid_max_concurrent() {
    assert!(config(0, 5, 1000).validate().is_err());
}

#[test]
fn test_dispatcher_config_invalid_rate() {
    assert!(config(2, 0, 1000).validate().is_err());
}

#[test]
fn test_dispatcher_config_invalid_window() {
    assert!(config(2, 5, 0).validate().is_err());
}

#[test]
fn test_limits_from_config() {
    let limits = config(3, 7, 250).limits();
    assert_eq!(limits.max_concurrent, 3);
    assert_eq!(limits.requests_per_second, 7);
    assert_eq!(limits.window, Duration::from_millis(250));
}

#[test]
fn test_scheduler_config_validation() {
    let mut dispatchers = std::collections::HashMap::new();
    dispatchers.insert("fetch".to_string(), config(2, 5, 1000));

    let cfg = SchedulerConfig { dispatchers };
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_scheduler_config_empty() {
    assert!(SchedulerConfig::default().validate().is_err());
}

#[test]
fn test_scheduler_config_names_bad_dispatcher() {
    let mut dispatchers = std::collections::HashMap::new();
    dispatchers.insert("persist".to_string(), config(2, 0, 1000));

    let err = SchedulerConfig { dispatchers }.validate().unwrap_err();
    assert!(err.to_string().contains("persist"));
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "dispatchers": {
            "fetch": {
                "max_concurrent": 2,
                "requests_per_second": 5
            },
            "persist": {
                "max_concurrent": 8,
                "requests_per_second": 50,
                "window_ms": 500
            }
        }
    }"#;

    let cfg = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.dispatchers["fetch"].window_ms, 1000);
    assert_eq!(cfg.dispatchers["persist"].window_ms, 500);
}

#[test]
fn test_scheduler_config_from_bad_json() {
    assert!(SchedulerConfig::from_json_str("{ not json").is_err());
}
