pub mod client;
pub mod error;
pub mod metafields;
pub mod pagination;
pub mod rate_limit;
pub mod store;
pub mod sync_flags;
pub mod types;

pub use client::{ClientSettings, ShopifyAdminClient, WriteMethod};
pub use error::ShopifyError;
pub use metafields::{index_by_namespace_key, list_metafields, upsert, MetafieldIndex, UpsertAction};
pub use rate_limit::RetryPolicy;
pub use store::CatalogStore;
pub use sync_flags::{get_sync_keys, set_sync_keys, sync_keys_from, SyncFlagWrite, SYNC_KEY, SYNC_NAMESPACE};
pub use types::{
    Metafield, MetafieldUpdate, NewMetafield, Owner, OwnerKind, Product, ProductStatus, ShopInfo,
    Variant,
};
