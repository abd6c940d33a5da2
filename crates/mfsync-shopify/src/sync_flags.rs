//! The per-owner set of metafield keys marked for cross-store propagation.
//!
//! Stored on the owner itself as the reserved metafield `sync.sync_fields`
//! (type `json`) holding a JSON array of keys, written sorted.

use std::collections::BTreeSet;

use mfsync_core::MetafieldType;

use crate::error::ShopifyError;
use crate::metafields::{index_by_namespace_key, upsert, UpsertAction};
use crate::store::CatalogStore;
use crate::types::{Metafield, Owner};

pub const SYNC_NAMESPACE: &str = "sync";
pub const SYNC_KEY: &str = "sync_fields";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncFlagWrite {
    Created,
    Updated,
    Unchanged,
}

/// Keys in the reserved metafield among `fields`.
///
/// A missing field, a value that is not a JSON array, or non-string entries
/// all read as "nothing marked".
#[must_use]
pub fn sync_keys_from(fields: &[Metafield]) -> BTreeSet<String> {
    reserved_field(fields)
        .and_then(|f| parse_keys(f.value.as_deref()))
        .unwrap_or_default()
}

/// Fetches `owner`'s metafields and extracts its sync keys.
///
/// # Errors
///
/// Returns the store error when the metafields cannot be read.
pub async fn get_sync_keys<S: CatalogStore>(
    store: &S,
    owner: Owner,
) -> Result<BTreeSet<String>, ShopifyError> {
    let fields = store.list_metafields(owner).await?;
    Ok(sync_keys_from(&fields))
}

/// Replaces `owner`'s sync keys with `keys`.
///
/// Nothing is written when the stored set already equals `keys`.
///
/// # Errors
///
/// Returns the store error from the read or the write.
pub async fn set_sync_keys<S: CatalogStore>(
    store: &S,
    owner: Owner,
    keys: &BTreeSet<String>,
) -> Result<SyncFlagWrite, ShopifyError> {
    let fields = store.list_metafields(owner).await?;
    let stored = match reserved_field(&fields) {
        Some(field) => parse_keys(field.value.as_deref()),
        None => Some(BTreeSet::new()),
    };
    if stored.as_ref() == Some(keys) {
        tracing::debug!(store = store.label(), %owner, "sync keys unchanged");
        return Ok(SyncFlagWrite::Unchanged);
    }

    let value = serde_json::Value::from(keys.iter().cloned().collect::<Vec<_>>()).to_string();
    let mut index = index_by_namespace_key(&fields);
    let action = upsert(
        store,
        owner,
        SYNC_NAMESPACE,
        SYNC_KEY,
        Some(&MetafieldType::Json("json".to_owned())),
        &value,
        &mut index,
    )
    .await?;

    tracing::info!(store = store.label(), %owner, keys = keys.len(), "sync keys saved");
    Ok(match action {
        UpsertAction::Created => SyncFlagWrite::Created,
        UpsertAction::Updated => SyncFlagWrite::Updated,
    })
}

fn reserved_field(fields: &[Metafield]) -> Option<&Metafield> {
    fields
        .iter()
        .find(|f| f.namespace == SYNC_NAMESPACE && f.key == SYNC_KEY)
}

fn parse_keys(raw: Option<&str>) -> Option<BTreeSet<String>> {
    let items: Vec<serde_json::Value> = serde_json::from_str(raw?).ok()?;
    Some(
        items
            .iter()
            .filter_map(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_owned)
            .collect(),
    )
}
