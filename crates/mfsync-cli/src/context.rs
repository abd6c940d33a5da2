//! Configuration and store connections for one CLI invocation.

use std::path::PathBuf;

use anyhow::Context as _;
use mfsync_core::{AppConfig, StoresFile};
use mfsync_shopify::{ClientSettings, ShopifyAdminClient};

pub struct Context {
    pub config: AppConfig,
    pub stores: StoresFile,
}

impl Context {
    /// Loads the stores file named by `stores_override`, or by
    /// `MFSYNC_STORES_PATH` when unset.
    pub fn load(config: AppConfig, stores_override: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = stores_override.unwrap_or_else(|| config.stores_path.clone());
        let stores = mfsync_core::load_stores(&path)
            .with_context(|| format!("loading stores from {}", path.display()))?;
        Ok(Self { config, stores })
    }

    /// Builds an Admin API client for the store with `key`.
    ///
    /// The access token is read from the store's token variable now, so a
    /// missing token only fails commands that touch that store.
    pub fn connect(&self, key: &str) -> anyhow::Result<ShopifyAdminClient> {
        let store = self.stores.get(key)?;
        let credentials = store.resolve_credentials(|var| std::env::var(var))?;
        let settings = ClientSettings::from_app_config(&self.config)
            .with_api_version(store.api_version.as_deref());
        ShopifyAdminClient::new(&store.label, &credentials, &settings)
            .map_err(|e| anyhow::anyhow!("failed to build client for {key}: {e}"))
    }

    pub fn write_delay_ms(&self) -> u64 {
        self.config.write_delay_ms
    }
}
