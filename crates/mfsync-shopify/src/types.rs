//! Admin REST API shapes for products, variants and metafields.
//!
//! ### Tags
//! The Admin API returns tags as one comma-separated string
//! (`"summer, sale"`), while the storefront `products.json` returns a JSON
//! array. Both are accepted and split into a `Vec<String>`.
//!
//! ### Metafield values
//! `value` is documented as a string, but `number_integer` and `boolean`
//! metafields come back as bare JSON scalars on some API versions. Scalars are
//! normalised to their string form so every value is handled as raw text
//! until it is coerced per declared type.
//!
//! ### Prices
//! Decimal strings (`"19.99"`), or `null` for an unset compare-at price.

use std::fmt;

use chrono::{DateTime, Utc};
use mfsync_core::MetafieldType;
use serde::{Deserialize, Deserializer, Serialize};

/// Top-level response from `GET /shop.json`.
#[derive(Debug, Deserialize)]
pub struct ShopResponse {
    pub shop: ShopInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopInfo {
    pub name: String,
    #[serde(default)]
    pub myshopify_domain: Option<String>,
}

/// Publication status of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ProductStatus {
    #[default]
    Active,
    Draft,
    Archived,
    Other(String),
}

impl From<String> for ProductStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "active" => Self::Active,
            "draft" => Self::Draft,
            "archived" => Self::Archived,
            _ => Self::Other(raw),
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Draft => f.write_str("draft"),
            Self::Archived => f.write_str("archived"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: i64,

    pub title: String,

    /// URL slug, unique within one store.
    #[serde(default)]
    pub handle: String,

    #[serde(default)]
    pub vendor: Option<String>,

    /// Category string. Empty string when unset.
    #[serde(default)]
    pub product_type: Option<String>,

    #[serde(default)]
    pub status: ProductStatus,

    #[serde(default, deserialize_with = "de_tags")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    /// `true` when the product is published (`status == active`).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Trimmed, non-empty barcodes of every variant, in variant order.
    pub fn barcodes(&self) -> impl Iterator<Item = &str> {
        self.variants
            .iter()
            .filter_map(|v| v.barcode.as_deref().map(str::trim))
            .filter(|b| !b.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    pub id: i64,

    #[serde(default)]
    pub product_id: Option<i64>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub sku: Option<String>,

    #[serde(default)]
    pub barcode: Option<String>,

    #[serde(default, deserialize_with = "de_opt_scalar")]
    pub price: Option<String>,

    #[serde(default, deserialize_with = "de_opt_scalar")]
    pub compare_at_price: Option<String>,

    /// 1-based position within the product.
    #[serde(default)]
    pub position: Option<i64>,

    #[serde(default)]
    pub option1: Option<String>,

    #[serde(default)]
    pub option2: Option<String>,

    #[serde(default)]
    pub option3: Option<String>,
}

/// Whether a metafield hangs off a product or a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    Product,
    Variant,
}

impl OwnerKind {
    /// Singular resource name used in `owner_resource`.
    #[must_use]
    pub fn resource(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Variant => "variant",
        }
    }

    fn collection(self) -> &'static str {
        match self {
            Self::Product => "products",
            Self::Variant => "variants",
        }
    }
}

/// The product or variant a metafield belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Owner {
    pub kind: OwnerKind,
    pub id: i64,
}

impl Owner {
    #[must_use]
    pub const fn product(id: i64) -> Self {
        Self {
            kind: OwnerKind::Product,
            id,
        }
    }

    #[must_use]
    pub const fn variant(id: i64) -> Self {
        Self {
            kind: OwnerKind::Variant,
            id,
        }
    }

    /// Owner-scoped metafield collection, e.g. `/products/42/metafields.json`.
    #[must_use]
    pub fn metafields_path(&self) -> String {
        format!("/{}/{}/metafields.json", self.kind.collection(), self.id)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.resource(), self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metafield {
    pub id: i64,

    pub namespace: String,

    pub key: String,

    #[serde(default, deserialize_with = "de_opt_scalar")]
    pub value: Option<String>,

    /// Raw declared type; see [`Metafield::declared_type`].
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,

    #[serde(default)]
    pub owner_id: Option<i64>,

    #[serde(default)]
    pub owner_resource: Option<String>,
}

impl Metafield {
    #[must_use]
    pub fn declared_type(&self) -> Option<MetafieldType> {
        MetafieldType::from_wire(self.type_name.as_deref())
    }

    /// `"namespace.key"`, the column/label form used in logs and exports.
    #[must_use]
    pub fn qualified_key(&self) -> String {
        format!("{}.{}", self.namespace, self.key)
    }
}

/// Body of a metafield create request.
#[derive(Debug, Clone, Serialize)]
pub struct NewMetafield {
    pub namespace: String,
    pub key: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: String,
}

/// Body of a metafield update request.
#[derive(Debug, Clone, Serialize)]
pub struct MetafieldUpdate {
    pub id: i64,
    pub value: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsWire {
    Joined(String),
    List(Vec<String>),
}

fn de_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<TagsWire>::deserialize(deserializer)?;
    let tags = match raw {
        None => Vec::new(),
        Some(TagsWire::Joined(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect(),
        Some(TagsWire::List(list)) => list,
    };
    Ok(tags)
}

fn de_opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
