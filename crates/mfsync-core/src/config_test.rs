use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "MFSYNC_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.stores_path, PathBuf::from("./config/stores.yaml"));
    assert_eq!(cfg.api_version, "2024-10");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "mfsync/0.1 (metafield-sync)");
    assert_eq!(cfg.page_size, 250);
    assert_eq!(cfg.max_retries, 5);
    assert_eq!(cfg.rate_limit_fallback_ms, 2000);
    assert_eq!(cfg.server_error_backoff_ms, 1500);
    assert_eq!(cfg.write_delay_ms, 50);
    assert_eq!(cfg.metafield_cache_ttl_secs, 60);
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("MFSYNC_ENV", "production");
    map.insert("MFSYNC_API_VERSION", "2025-01");
    map.insert("MFSYNC_MAX_RETRIES", "2");
    map.insert("MFSYNC_WRITE_DELAY_MS", "0");
    map.insert("MFSYNC_STORES_PATH", "/etc/mfsync/stores.yaml");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.api_version, "2025-01");
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.write_delay_ms, 0);
    assert_eq!(cfg.stores_path, PathBuf::from("/etc/mfsync/stores.yaml"));
}

#[test]
fn build_app_config_rejects_non_numeric_retries() {
    let mut map = HashMap::new();
    map.insert("MFSYNC_MAX_RETRIES", "lots");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MFSYNC_MAX_RETRIES"),
        "expected InvalidEnvVar(MFSYNC_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_page_size_above_shopify_cap() {
    let mut map = HashMap::new();
    map.insert("MFSYNC_PAGE_SIZE", "500");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MFSYNC_PAGE_SIZE"),
        "expected InvalidEnvVar(MFSYNC_PAGE_SIZE), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_page_size() {
    let mut map = HashMap::new();
    map.insert("MFSYNC_PAGE_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn build_app_config_rejects_blank_api_version() {
    let mut map = HashMap::new();
    map.insert("MFSYNC_API_VERSION", "  ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MFSYNC_API_VERSION"),
        "expected InvalidEnvVar(MFSYNC_API_VERSION), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_invalid_cache_ttl() {
    let mut map = HashMap::new();
    map.insert("MFSYNC_METAFIELD_CACHE_TTL_SECS", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MFSYNC_METAFIELD_CACHE_TTL_SECS"),
        "expected InvalidEnvVar(MFSYNC_METAFIELD_CACHE_TTL_SECS), got: {result:?}"
    );
}
