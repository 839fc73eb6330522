/// Tests for main.rs initialization logic
/// These tests verify configuration and initialization behavior
use media_ferry_client::config::Config;
use media_ferry_host::{QUIET_TARGETS, env_filter, log_filter_from};

#[test]
fn test_log_env_priority() {
    let both = |k: &str| match k {
        "MEDIA_FERRY_LOG_LEVEL" => Some("debug".to_string()),
        "RUST_LOG" => Some("trace".to_string()),
        _ => None,
    };
    assert_eq!(log_filter_from(both), "debug");

    let rust_log_only = |k: &str| (k == "RUST_LOG").then(|| "warn".to_string());
    assert_eq!(log_filter_from(rust_log_only), "warn");

    assert_eq!(log_filter_from(|_| None), "info");
}

#[test]
fn test_combined_filter_format() {
    let filter = env_filter("debug");
    let rendered = filter.to_string();
    assert!(rendered.contains("debug"));
    assert!(rendered.contains("reqwest=warn"));
    assert!(QUIET_TARGETS.contains("hyper=warn"));
}

#[test]
fn test_env_filter_fallback() {
    // Invalid filter falls back to the default instead of panicking
    let filter = env_filter("invalid[[[filter");
    assert!(filter.to_string().contains("info"));
}

#[test]
fn test_config_from_env_defaults() {
    let get = |k: &str| (k == "HOME").then(|| "/home/ferry".to_string());
    let config = Config::from_env_with(get).expect("config");
    assert_eq!(config.base_url, "http://localhost:8590");
    assert!(config.download_folder().ends_with("Downloads/MediaFerry"));
}

#[test]
fn test_config_requires_download_location() {
    assert!(Config::from_env_with(|_| None).is_err());
}
