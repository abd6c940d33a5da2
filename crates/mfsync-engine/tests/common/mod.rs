//! In-memory catalog used by the engine integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use mfsync_shopify::{
    CatalogStore, Metafield, MetafieldUpdate, NewMetafield, Owner, Product, ShopifyError,
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Create { owner: Owner, namespace: String, key: String, type_name: String, value: String },
    Update { id: i64, value: String, type_name: Option<String> },
}

#[derive(Default)]
struct State {
    products: Vec<Product>,
    metafields: HashMap<Owner, Vec<Metafield>>,
    writes: Vec<Write>,
    metafield_reads: HashMap<Owner, usize>,
    product_reads: usize,
    unreadable: HashSet<Owner>,
    failing_keys: HashSet<String>,
    products_unavailable: bool,
}

pub struct FakeStore {
    label: String,
    next_id: AtomicI64,
    state: Mutex<State>,
}

impl FakeStore {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            next_id: AtomicI64::new(10_000),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_product(self, product: Product) -> Self {
        self.state.lock().unwrap().products.push(product);
        self
    }

    pub fn with_field(self, owner: Owner, namespace: &str, key: &str, type_name: &str, value: &str) -> Self {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .unwrap()
            .metafields
            .entry(owner)
            .or_default()
            .push(metafield(id, owner, namespace, key, type_name, value));
        self
    }

    /// Listing this owner's metafields fails.
    pub fn unreadable(self, owner: Owner) -> Self {
        self.state.lock().unwrap().unreadable.insert(owner);
        self
    }

    /// Writes to `namespace.key` fail with a 422.
    pub fn failing_write(self, qualified_key: &str) -> Self {
        self.state.lock().unwrap().failing_keys.insert(qualified_key.to_owned());
        self
    }

    pub fn products_unavailable(self) -> Self {
        self.state.lock().unwrap().products_unavailable = true;
        self
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn metafield_reads(&self, owner: Owner) -> usize {
        self.state.lock().unwrap().metafield_reads.get(&owner).copied().unwrap_or(0)
    }

    pub fn product_reads(&self) -> usize {
        self.state.lock().unwrap().product_reads
    }

    /// Current `namespace.key -> value` of an owner.
    pub fn values(&self, owner: Owner) -> HashMap<String, String> {
        self.state
            .lock()
            .unwrap()
            .metafields
            .get(&owner)
            .into_iter()
            .flatten()
            .map(|f| (f.qualified_key(), f.value.clone().unwrap_or_default()))
            .collect()
    }

    pub fn field_count(&self, owner: Owner) -> usize {
        self.state
            .lock()
            .unwrap()
            .metafields
            .get(&owner)
            .map_or(0, Vec::len)
    }

    pub fn field(&self, owner: Owner, qualified_key: &str) -> Option<Metafield> {
        self.state
            .lock()
            .unwrap()
            .metafields
            .get(&owner)
            .into_iter()
            .flatten()
            .find(|f| f.qualified_key() == qualified_key)
            .cloned()
    }

    fn rejected(&self, qualified_key: &str) -> Option<ShopifyError> {
        self.state
            .lock()
            .unwrap()
            .failing_keys
            .contains(qualified_key)
            .then(|| ShopifyError::Api {
                status: 422,
                url: format!("https://{}.test/metafields", self.label),
                message: "value: is invalid".to_owned(),
            })
    }
}

impl CatalogStore for FakeStore {
    fn label(&self) -> &str {
        &self.label
    }

    async fn list_products(&self) -> Result<Vec<Product>, ShopifyError> {
        let mut state = self.state.lock().unwrap();
        state.product_reads += 1;
        if state.products_unavailable {
            return Err(ShopifyError::ServerError {
                status: 503,
                url: format!("https://{}.test/products.json", self.label),
            });
        }
        Ok(state.products.clone())
    }

    async fn get_product(&self, product_id: i64) -> Result<Option<Product>, ShopifyError> {
        let state = self.state.lock().unwrap();
        Ok(state.products.iter().find(|p| p.id == product_id).cloned())
    }

    async fn list_metafields(&self, owner: Owner) -> Result<Vec<Metafield>, ShopifyError> {
        let mut state = self.state.lock().unwrap();
        *state.metafield_reads.entry(owner).or_default() += 1;
        if state.unreadable.contains(&owner) {
            return Err(ShopifyError::ServerError {
                status: 500,
                url: format!("https://{}.test{}", self.label, owner.metafields_path()),
            });
        }
        Ok(state.metafields.get(&owner).cloned().unwrap_or_default())
    }

    async fn create_metafield(
        &self,
        owner: Owner,
        field: &NewMetafield,
    ) -> Result<Metafield, ShopifyError> {
        if let Some(err) = self.rejected(&format!("{}.{}", field.namespace, field.key)) {
            return Err(err);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = metafield(id, owner, &field.namespace, &field.key, &field.type_name, &field.value);
        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::Create {
            owner,
            namespace: field.namespace.clone(),
            key: field.key.clone(),
            type_name: field.type_name.clone(),
            value: field.value.clone(),
        });
        state.metafields.entry(owner).or_default().push(stored.clone());
        Ok(stored)
    }

    async fn update_metafield(&self, field: &MetafieldUpdate) -> Result<Metafield, ShopifyError> {
        let key = {
            let state = self.state.lock().unwrap();
            state
                .metafields
                .values()
                .flatten()
                .find(|f| f.id == field.id)
                .map(Metafield::qualified_key)
        };
        let Some(key) = key else {
            return Err(ShopifyError::Api {
                status: 404,
                url: format!("https://{}.test/metafields/{}.json", self.label, field.id),
                message: "Not Found".to_owned(),
            });
        };
        if let Some(err) = self.rejected(&key) {
            return Err(err);
        }

        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::Update {
            id: field.id,
            value: field.value.clone(),
            type_name: field.type_name.clone(),
        });
        let stored = state
            .metafields
            .values_mut()
            .flatten()
            .find(|f| f.id == field.id)
            .expect("field located above");
        stored.value = Some(field.value.clone());
        if let Some(type_name) = &field.type_name {
            stored.type_name = Some(type_name.clone());
        }
        Ok(stored.clone())
    }
}

pub fn metafield(id: i64, owner: Owner, namespace: &str, key: &str, type_name: &str, value: &str) -> Metafield {
    serde_json::from_value(json!({
        "id": id,
        "namespace": namespace,
        "key": key,
        "type": type_name,
        "value": value,
        "owner_id": owner.id,
        "owner_resource": owner.kind.resource(),
    }))
    .unwrap()
}

/// Product JSON with `variants` given as `(id, title, sku, barcode)`.
pub fn product(
    id: i64,
    title: &str,
    handle: &str,
    status: &str,
    variants: &[(i64, &str, &str, &str)],
) -> Product {
    let variants: Vec<serde_json::Value> = variants
        .iter()
        .map(|(vid, vtitle, sku, barcode)| {
            json!({"id": vid, "product_id": id, "title": vtitle, "sku": sku, "barcode": barcode})
        })
        .collect();
    serde_json::from_value(json!({
        "id": id,
        "title": title,
        "handle": handle,
        "status": status,
        "variants": variants,
    }))
    .unwrap()
}
