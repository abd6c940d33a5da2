use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide settings for the sync tools.
///
/// Store credentials are deliberately absent: each store names the env var
/// holding its token in `stores.yaml`, and tokens are resolved per store at
/// connect time (see [`crate::StoreConfig::resolve_credentials`]).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub stores_path: PathBuf,
    /// Admin REST API version segment, e.g. `"2024-10"`.
    pub api_version: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Page size for list endpoints. Shopify caps this at 250.
    pub page_size: u32,
    /// Additional attempts after the first failure for retriable errors.
    pub max_retries: u32,
    /// Base delay for 429 responses that carry no `Retry-After` hint.
    pub rate_limit_fallback_ms: u64,
    /// Linear step for 5xx / network retries: `step * (attempt + 1)`.
    pub server_error_backoff_ms: u64,
    /// Courtesy pause after every live metafield write.
    pub write_delay_ms: u64,
    pub metafield_cache_ttl_secs: u64,
}
