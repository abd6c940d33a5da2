//! The catalog operations the sync engine needs from one store.

use crate::client::{ShopifyAdminClient, WriteMethod};
use crate::error::ShopifyError;
use crate::types::{Metafield, MetafieldUpdate, NewMetafield, Owner, Product};

/// Read and write access to one store's products and metafields.
///
/// [`ShopifyAdminClient`] is the production implementation; the engine's tests
/// use an in-memory catalog.
#[allow(async_fn_in_trait)]
pub trait CatalogStore {
    /// Operator-facing store name used in logs.
    fn label(&self) -> &str;

    async fn list_products(&self) -> Result<Vec<Product>, ShopifyError>;

    /// `Ok(None)` when the product does not exist.
    async fn get_product(&self, product_id: i64) -> Result<Option<Product>, ShopifyError>;

    /// Every metafield of `owner`, fully paginated.
    async fn list_metafields(&self, owner: Owner) -> Result<Vec<Metafield>, ShopifyError>;

    async fn create_metafield(
        &self,
        owner: Owner,
        field: &NewMetafield,
    ) -> Result<Metafield, ShopifyError>;

    async fn update_metafield(&self, field: &MetafieldUpdate) -> Result<Metafield, ShopifyError>;
}

impl CatalogStore for ShopifyAdminClient {
    fn label(&self) -> &str {
        self.store_label()
    }

    async fn list_products(&self) -> Result<Vec<Product>, ShopifyError> {
        ShopifyAdminClient::list_products(self).await
    }

    async fn get_product(&self, product_id: i64) -> Result<Option<Product>, ShopifyError> {
        ShopifyAdminClient::get_product(self, product_id).await
    }

    async fn list_metafields(&self, owner: Owner) -> Result<Vec<Metafield>, ShopifyError> {
        self.fetch_all(&owner.metafields_path(), &[], "metafields")
            .await
    }

    async fn create_metafield(
        &self,
        owner: Owner,
        field: &NewMetafield,
    ) -> Result<Metafield, ShopifyError> {
        let body = serde_json::json!({ "metafield": field });
        let response = self
            .write(WriteMethod::Post, &owner.metafields_path(), &body)
            .await?;
        metafield_from_envelope(response, &format!("create {}.{} on {owner}", field.namespace, field.key))
    }

    async fn update_metafield(&self, field: &MetafieldUpdate) -> Result<Metafield, ShopifyError> {
        let body = serde_json::json!({ "metafield": field });
        let path = format!("/metafields/{}.json", field.id);
        let response = self.write(WriteMethod::Put, &path, &body).await?;
        metafield_from_envelope(response, &format!("update metafield {}", field.id))
    }
}

/// Unwraps `{"metafield": {...}}`.
fn metafield_from_envelope(
    mut response: serde_json::Value,
    context: &str,
) -> Result<Metafield, ShopifyError> {
    let inner = response
        .get_mut("metafield")
        .map(serde_json::Value::take)
        .ok_or_else(|| ShopifyError::MissingField {
            context: context.to_owned(),
            field: "metafield".to_owned(),
        })?;
    serde_json::from_value(inner).map_err(|source| ShopifyError::Deserialize {
        context: context.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_is_unwrapped() {
        let field = metafield_from_envelope(
            json!({"metafield": {"id": 9, "namespace": "details", "key": "color", "value": "red", "type": "single_line_text_field"}}),
            "ctx",
        )
        .unwrap();
        assert_eq!(field.id, 9);
        assert_eq!(field.qualified_key(), "details.color");
    }

    #[test]
    fn missing_envelope_is_reported() {
        let err = metafield_from_envelope(json!({"errors": "x"}), "create details.color").unwrap_err();
        assert!(matches!(err, ShopifyError::MissingField { ref field, .. } if field == "metafield"));
    }
}
