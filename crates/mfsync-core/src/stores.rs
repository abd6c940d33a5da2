use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// The sync tools address at most one donor plus four receivers.
const MAX_STORES: usize = 5;

/// One storefront as declared in `stores.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Short operator-facing handle, e.g. `"a"` or `"eu"`.
    pub key: String,
    /// Display name used in logs, e.g. `"Shop A"`.
    pub label: String,
    /// `yourstore.myshopify.com`, or a full `http(s)://` origin.
    pub shop_domain: String,
    /// Name of the environment variable holding the Admin API access token.
    pub token_env: String,
    /// Per-store override of `MFSYNC_API_VERSION`.
    #[serde(default)]
    pub api_version: Option<String>,
}

impl StoreConfig {
    /// Resolve this store's access token through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if the token variable is unset
    /// or blank.
    pub fn resolve_credentials<F>(&self, lookup: F) -> Result<StoreCredentials, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let access_token = lookup(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(self.token_env.clone()))?;
        Ok(StoreCredentials {
            shop_domain: self.shop_domain.clone(),
            access_token,
        })
    }
}

/// Domain plus secret token for one store.
#[derive(Clone)]
pub struct StoreCredentials {
    pub shop_domain: String,
    pub access_token: String,
}

impl std::fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("shop_domain", &self.shop_domain)
            .field("access_token", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct StoresFile {
    pub stores: Vec<StoreConfig>,
}

impl StoresFile {
    /// Look a store up by its `key`, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownStore`] when no store has that key.
    pub fn get(&self, key: &str) -> Result<&StoreConfig, ConfigError> {
        self.stores
            .iter()
            .find(|s| s.key.eq_ignore_ascii_case(key))
            .ok_or_else(|| ConfigError::UnknownStore(key.to_string()))
    }
}

/// Load and validate the store list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_stores(path: &Path) -> Result<StoresFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StoresFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_stores(&content)
}

fn parse_stores(content: &str) -> Result<StoresFile, ConfigError> {
    let stores_file: StoresFile = serde_yaml::from_str(content)?;
    validate_stores(&stores_file)?;
    Ok(stores_file)
}

fn validate_stores(stores_file: &StoresFile) -> Result<(), ConfigError> {
    if stores_file.stores.is_empty() {
        return Err(ConfigError::Validation(
            "at least one store must be configured".to_string(),
        ));
    }
    if stores_file.stores.len() > MAX_STORES {
        return Err(ConfigError::Validation(format!(
            "at most {MAX_STORES} stores are supported, found {}",
            stores_file.stores.len()
        )));
    }

    let mut seen_keys = HashSet::new();
    let mut seen_labels = HashSet::new();
    for store in &stores_file.stores {
        if store.key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store key must be non-empty".to_string(),
            ));
        }
        if store.label.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{}' has an empty label",
                store.key
            )));
        }
        if store.shop_domain.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{}' has an empty shop_domain",
                store.key
            )));
        }
        if store.token_env.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{}' has an empty token_env",
                store.key
            )));
        }
        if !seen_keys.insert(store.key.to_ascii_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate store key: '{}'",
                store.key
            )));
        }
        if !seen_labels.insert(store.label.trim().to_owned()) {
            return Err(ConfigError::Validation(format!(
                "duplicate store label: '{}'",
                store.label
            )));
        }
    }

    Ok(())
}
