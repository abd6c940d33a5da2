//! Reading, indexing and writing the metafields of one owner.

use std::collections::HashMap;

use mfsync_core::MetafieldType;

use crate::error::ShopifyError;
use crate::store::CatalogStore;
use crate::types::{Metafield, MetafieldUpdate, NewMetafield, Owner};

/// Type sent when creating a metafield whose source declares none.
pub const DEFAULT_CREATE_TYPE: &str = "single_line_text_field";

/// Metafields of one owner keyed by `(namespace, key)`.
pub type MetafieldIndex = HashMap<(String, String), Metafield>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

impl UpsertAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// Every metafield attached to `owner`.
///
/// # Errors
///
/// Propagates the store error; callers decide whether an unreadable owner
/// counts as empty or aborts their pass.
pub async fn list_metafields<S: CatalogStore>(
    store: &S,
    owner: Owner,
) -> Result<Vec<Metafield>, ShopifyError> {
    store.list_metafields(owner).await
}

/// Indexes `fields` by `(namespace, key)`. If a pair repeats, the first one wins.
#[must_use]
pub fn index_by_namespace_key(fields: &[Metafield]) -> MetafieldIndex {
    let mut index = MetafieldIndex::with_capacity(fields.len());
    for field in fields {
        index
            .entry((field.namespace.clone(), field.key.clone()))
            .or_insert_with(|| field.clone());
    }
    index
}

/// Writes `value` to `namespace.key` on `owner`, updating in place when the
/// index already holds the pair and creating it otherwise.
///
/// On update the existing declared type is kept unless it is unset or the
/// legacy generic `string`, in which case `declared` is sent. On create
/// `declared` is sent, or [`DEFAULT_CREATE_TYPE`] when there is none.
///
/// `index` is refreshed with the stored metafield so a later upsert of the
/// same pair in the same pass updates instead of creating a duplicate.
///
/// # Errors
///
/// Returns the store error; the index is left untouched in that case.
pub async fn upsert<S: CatalogStore>(
    store: &S,
    owner: Owner,
    namespace: &str,
    key: &str,
    declared: Option<&MetafieldType>,
    value: &str,
    index: &mut MetafieldIndex,
) -> Result<UpsertAction, ShopifyError> {
    let slot = (namespace.to_owned(), key.to_owned());

    let (stored, action) = if let Some(existing) = index.get(&slot) {
        let type_name = if MetafieldType::is_generic(existing.declared_type().as_ref()) {
            declared.map(|t| t.as_wire().to_owned())
        } else {
            None
        };
        let update = MetafieldUpdate {
            id: existing.id,
            value: value.to_owned(),
            type_name,
        };
        (store.update_metafield(&update).await?, UpsertAction::Updated)
    } else {
        let create = NewMetafield {
            namespace: namespace.to_owned(),
            key: key.to_owned(),
            type_name: declared.map_or(DEFAULT_CREATE_TYPE, MetafieldType::as_wire).to_owned(),
            value: value.to_owned(),
        };
        (store.create_metafield(owner, &create).await?, UpsertAction::Created)
    };

    tracing::debug!(
        store = store.label(),
        %owner,
        field = %format_args!("{namespace}.{key}"),
        action = action.as_str(),
        "metafield written"
    );
    index.insert(slot, stored);
    Ok(action)
}
