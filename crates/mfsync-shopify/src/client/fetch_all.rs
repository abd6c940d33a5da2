//! Multi-page list fetches for `ShopifyAdminClient`.

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::error::ShopifyError;
use crate::pagination::next_page_info;
use crate::types::Product;

use super::{decode, ShopifyAdminClient, MAX_PAGES};

impl ShopifyAdminClient {
    /// Fetches every page of a list endpoint and returns the items under
    /// `collection_key`, in page order.
    ///
    /// The first request carries `limit` plus `query`; follow-up requests carry
    /// only `limit` and `page_info`.
    ///
    /// All-or-nothing: a failure on any page discards the pages already read.
    ///
    /// # Errors
    ///
    /// Any [`ShopifyError`] from a page request,
    /// [`ShopifyError::MissingField`] when a page has no `collection_key`, and
    /// [`ShopifyError::PaginationLimit`] past [`MAX_PAGES`] pages.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        resource_path: &str,
        query: &[(&str, String)],
        collection_key: &str,
    ) -> Result<Vec<T>, ShopifyError> {
        let limit = self.page_size.to_string();
        let mut items: Vec<T> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(ShopifyError::PaginationLimit {
                    path: resource_path.to_owned(),
                    max_pages: MAX_PAGES,
                });
            }

            let mut params: Vec<(&str, String)> = vec![("limit", limit.clone())];
            match &cursor {
                Some(page_info) => params.push(("page_info", page_info.clone())),
                None => params.extend(query.iter().cloned()),
            }

            let url = self.endpoint(resource_path, &params)?;
            let page = self.send(Method::GET, url, None).await?;

            let context = || format!("{resource_path} page {page_count} of {}", self.store_label);
            let mut envelope: serde_json::Map<String, serde_json::Value> =
                decode(&page.body, context)?;
            let collection =
                envelope
                    .remove(collection_key)
                    .ok_or_else(|| ShopifyError::MissingField {
                        context: context(),
                        field: collection_key.to_owned(),
                    })?;
            let batch: Vec<T> =
                serde_json::from_value(collection).map_err(|source| ShopifyError::Deserialize {
                    context: context(),
                    source,
                })?;

            tracing::debug!(
                store = %self.store_label,
                path = resource_path,
                page = page_count,
                count = batch.len(),
                "fetched page"
            );
            items.extend(batch);

            cursor = next_page_info(page.link.as_deref());
            if cursor.is_none() {
                break;
            }
        }

        Ok(items)
    }

    /// Every product in the store, with variants.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_all`].
    pub async fn list_products(&self) -> Result<Vec<Product>, ShopifyError> {
        self.fetch_all("/products.json", &[], "products").await
    }
}
