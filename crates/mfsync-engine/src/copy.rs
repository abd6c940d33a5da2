//! One donor → receiver metafield copy pass.

use std::collections::BTreeSet;
use std::time::Duration;

use mfsync_core::coerce;
use mfsync_shopify::{
    index_by_namespace_key, sync_keys_from, upsert, CatalogStore, Metafield, Owner, UpsertAction,
};

use crate::filter::{CopyFilter, FilterVerdict};
use crate::result::CopyResult;

/// Default pause between live writes.
pub const DEFAULT_WRITE_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct CopyOptions {
    pub filter: CopyFilter,
    /// Replace values already present on the receiver.
    pub overwrite: bool,
    /// Classify and log without writing.
    pub dry_run: bool,
    /// Pause between live writes.
    pub write_delay: Duration,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            filter: CopyFilter::default(),
            overwrite: false,
            dry_run: false,
            write_delay: DEFAULT_WRITE_DELAY,
        }
    }
}

/// Reads the donor's metafields, then runs [`copy_from_fields`].
///
/// A donor that cannot be read ends the pass with one error.
pub async fn copy_metafields<D, R>(
    donor: &D,
    donor_owner: Owner,
    receiver: &R,
    receiver_owner: Owner,
    options: &CopyOptions,
) -> CopyResult
where
    D: CatalogStore,
    R: CatalogStore,
{
    let context = pass_context(donor.label(), donor_owner, receiver.label(), receiver_owner);
    match donor.list_metafields(donor_owner).await {
        Ok(fields) => copy_from_fields(&context, &fields, receiver, receiver_owner, options).await,
        Err(err) => discovery_failure(&context, "donor", &err.to_string()),
    }
}

/// Copies already-fetched donor `fields` onto `receiver_owner`.
///
/// Per field: filter, classify as create or update, apply the overwrite gate,
/// coerce the donor value per its declared type, then write (or, in a dry
/// run, log the intended write). Live writes are spaced by `write_delay`. Field-level failures are counted and the
/// pass carries on. A receiver that cannot be read ends the pass with one
/// error.
pub async fn copy_from_fields<R: CatalogStore>(
    context: &str,
    fields: &[Metafield],
    receiver: &R,
    receiver_owner: Owner,
    options: &CopyOptions,
) -> CopyResult {
    let sync_keys = if options.filter.only_synced {
        sync_keys_from(fields)
    } else {
        BTreeSet::new()
    };

    let existing = match receiver.list_metafields(receiver_owner).await {
        Ok(existing) => existing,
        Err(err) => return discovery_failure(context, "receiver", &err.to_string()),
    };
    let mut index = index_by_namespace_key(&existing);

    let mut result = CopyResult::default();
    let mut wrote = false;
    for field in fields {
        match options.filter.check(field, &sync_keys) {
            FilterVerdict::Keep => {}
            FilterVerdict::SkipReserved => {
                result.counts.skipped_reserved += 1;
                continue;
            }
            FilterVerdict::SkipNamespace => {
                result.counts.skipped_namespace += 1;
                continue;
            }
            FilterVerdict::SkipKeyFilter => {
                result.counts.skipped_key_filter += 1;
                continue;
            }
            FilterVerdict::SkipNotSynced => {
                result.counts.skipped_not_synced += 1;
                continue;
            }
        }

        result.counts.attempted += 1;
        let name = field.qualified_key();
        let exists = index.contains_key(&(field.namespace.clone(), field.key.clone()));

        if exists && !options.overwrite {
            result.counts.skipped_existing += 1;
            result.line(format!("{context} {name}: skipped, already set"));
            continue;
        }

        let declared = field.declared_type();
        let value = match coerce(field.value.as_deref(), declared.as_ref()) {
            Ok(value) => value.to_wire(),
            Err(err) => {
                result.counts.errors += 1;
                tracing::warn!(context, field = %name, error = %err, "metafield value rejected");
                result.line(format!("{context} {name}: error: {err}"));
                continue;
            }
        };

        if options.dry_run {
            let action = if exists { UpsertAction::Updated } else { UpsertAction::Created };
            record_copy(&mut result, action);
            let verb = if exists { "would update" } else { "would create" };
            tracing::info!(context, field = %name, "{verb}");
            result.line(format!("{context} {name}: {verb}"));
            continue;
        }

        if wrote && !options.write_delay.is_zero() {
            tokio::time::sleep(options.write_delay).await;
        }
        wrote = true;

        match upsert(
            receiver,
            receiver_owner,
            &field.namespace,
            &field.key,
            declared.as_ref(),
            &value,
            &mut index,
        )
        .await
        {
            Ok(action) => {
                record_copy(&mut result, action);
                tracing::info!(context, field = %name, action = action.as_str(), "metafield copied");
                result.line(format!("{context} {name}: {}", action.as_str()));
            }
            Err(err) => {
                result.counts.errors += 1;
                tracing::warn!(context, field = %name, error = %err, "metafield write failed");
                result.line(format!("{context} {name}: error: {err}"));
            }
        }
    }

    let summary = format!("{context} {}", result.summary_line());
    tracing::info!(context, counts = %result.counts, "copy pass finished");
    result.line(summary);
    result
}

/// Log prefix naming both ends of a pass, e.g. `[Shop A product 1 -> Shop B product 9]`.
#[must_use]
pub fn pass_context(
    donor_label: &str,
    donor_owner: Owner,
    receiver_label: &str,
    receiver_owner: Owner,
) -> String {
    format!("[{donor_label} {donor_owner} -> {receiver_label} {receiver_owner}]")
}

fn record_copy(result: &mut CopyResult, action: UpsertAction) {
    result.counts.copied += 1;
    match action {
        UpsertAction::Created => result.counts.created += 1,
        UpsertAction::Updated => result.counts.updated += 1,
    }
}

pub(crate) fn discovery_failure(context: &str, side: &str, message: &str) -> CopyResult {
    tracing::warn!(context, side, error = message, "could not read metafields");
    let mut result = CopyResult::default();
    result.counts.errors += 1;
    result.line(format!("{context} error reading {side} metafields: {message}"));
    result
}
