//! Per-operation store context and caches.

use std::sync::Arc;
use std::time::Duration;

use mfsync_shopify::{CatalogStore, Metafield, Owner, Product, ShopifyError};
use moka::future::Cache;

/// One store's client plus its product list, loaded on first use.
///
/// Nothing is shared between operations; create one session per command.
pub struct StoreSession<S> {
    store: S,
    products: Option<Vec<Product>>,
}

impl<S: CatalogStore> StoreSession<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            products: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn label(&self) -> &str {
        self.store.label()
    }

    /// The store's products, fetched once per session.
    ///
    /// # Errors
    ///
    /// Returns the store error when the first fetch fails; nothing is cached then.
    pub async fn products(&mut self) -> Result<&[Product], ShopifyError> {
        if self.products.is_none() {
            let products = self.store.list_products().await?;
            tracing::debug!(store = self.store.label(), count = products.len(), "product list loaded");
            self.products = Some(products);
        }
        Ok(self.products.as_deref().unwrap_or_default())
    }

    /// Drops the cached product list and fetches it again.
    ///
    /// # Errors
    ///
    /// Returns the store error from the fetch.
    pub async fn refresh_products(&mut self) -> Result<&[Product], ShopifyError> {
        self.products = None;
        self.products().await
    }
}

/// Short-lived cache of donor metafields keyed by store label and owner.
/// Labels are unique within a stores file.
///
/// A multi-receiver sync reads each donor owner once instead of once per
/// receiver.
#[derive(Clone)]
pub struct MetafieldCache {
    inner: Cache<(String, Owner), Arc<Vec<Metafield>>>,
}

impl MetafieldCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    /// Cached metafields of `owner` in `store`, fetched on a miss.
    ///
    /// # Errors
    ///
    /// Returns the store error on a miss whose fetch fails; failures are not cached.
    pub async fn get_or_fetch<S: CatalogStore>(
        &self,
        store: &S,
        owner: Owner,
    ) -> Result<Arc<Vec<Metafield>>, ShopifyError> {
        let key = (store.label().to_owned(), owner);
        if let Some(fields) = self.inner.get(&key).await {
            tracing::debug!(store = store.label(), %owner, "metafield cache hit");
            return Ok(fields);
        }
        let fields = Arc::new(store.list_metafields(owner).await?);
        self.inner.insert(key, Arc::clone(&fields)).await;
        Ok(fields)
    }

    pub async fn invalidate<S: CatalogStore>(&self, store: &S, owner: Owner) {
        self.inner
            .invalidate(&(store.label().to_owned(), owner))
            .await;
    }
}
