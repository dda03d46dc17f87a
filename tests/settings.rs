//! Integration tests for loading provider settings from the environment.

#![allow(unsafe_code)] // For env var manipulation in tests

use hotswap_kv_config::core::{KvConfigSource, KvSourceSettings};
use hotswap_kv_config::error::ConfigError;
use std::time::Duration;

#[test]
fn test_settings_from_env() {
    unsafe {
        std::env::set_var("KVTEST_FULL_WATCH_KEY", "services/api");
        std::env::set_var("KVTEST_FULL_KEY_TO_REMOVE", "services");
        std::env::set_var("KVTEST_FULL_OPTIONAL", "true");
        std::env::set_var("KVTEST_FULL_RELOAD_ON_CHANGE", "true");
        std::env::set_var("KVTEST_FULL_DISPOSE_TIMEOUT_MS", "750");
    }

    let settings = KvSourceSettings::from_env("KVTEST_FULL").unwrap();
    assert_eq!(settings.watch_key, "services/api");
    assert_eq!(settings.key_to_remove.as_deref(), Some("services"));
    assert!(settings.optional);
    assert!(settings.reload_on_change);
    assert_eq!(settings.dispose_timeout_ms, 750);

    let source = KvConfigSource::from_settings(settings).build();
    assert_eq!(source.key_to_remove(), "services");
    assert_eq!(source.dispose_timeout(), Duration::from_millis(750));
}

#[test]
fn test_settings_from_env_defaults() {
    unsafe {
        std::env::set_var("KVTEST_MIN_WATCH_KEY", "app");
    }

    let settings = KvSourceSettings::from_env("KVTEST_MIN").unwrap();
    assert_eq!(settings.watch_key, "app");
    assert!(!settings.optional);
    assert!(!settings.reload_on_change);
    assert_eq!(settings.dispose_timeout_ms, 500);
}

#[test]
fn test_settings_from_env_missing_watch_key() {
    let err = KvSourceSettings::from_env("KVTEST_ABSENT").unwrap_err();
    assert!(matches!(err, ConfigError::Settings(_)));
}
