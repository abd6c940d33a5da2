use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Shopify refuses list requests with `limit` above this value.
const MAX_PAGE_SIZE: u32 = 250;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("MFSYNC_ENV", "development"))?;
    let log_level = or_default("MFSYNC_LOG_LEVEL", "info");
    let stores_path = PathBuf::from(or_default("MFSYNC_STORES_PATH", "./config/stores.yaml"));
    let api_version = or_default("MFSYNC_API_VERSION", "2024-10");
    if api_version.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "MFSYNC_API_VERSION".to_string(),
            reason: "must be non-empty".to_string(),
        });
    }

    let request_timeout_secs = parse_u64("MFSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("MFSYNC_USER_AGENT", "mfsync/0.1 (metafield-sync)");

    let page_size = parse_u32("MFSYNC_PAGE_SIZE", "250")?;
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::InvalidEnvVar {
            var: "MFSYNC_PAGE_SIZE".to_string(),
            reason: format!("must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"),
        });
    }

    let max_retries = parse_u32("MFSYNC_MAX_RETRIES", "5")?;
    let rate_limit_fallback_ms = parse_u64("MFSYNC_RATE_LIMIT_FALLBACK_MS", "2000")?;
    let server_error_backoff_ms = parse_u64("MFSYNC_SERVER_ERROR_BACKOFF_MS", "1500")?;
    let write_delay_ms = parse_u64("MFSYNC_WRITE_DELAY_MS", "50")?;
    let metafield_cache_ttl_secs = parse_u64("MFSYNC_METAFIELD_CACHE_TTL_SECS", "60")?;

    Ok(AppConfig {
        env,
        log_level,
        stores_path,
        api_version,
        request_timeout_secs,
        user_agent,
        page_size,
        max_retries,
        rate_limit_fallback_ms,
        server_error_backoff_ms,
        write_delay_ms,
        metafield_cache_ttl_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MFSYNC_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
