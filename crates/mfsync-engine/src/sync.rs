//! Donor product → receiver stores propagation.

use std::fmt;

use mfsync_shopify::{CatalogStore, Owner, Product};

use crate::copy::{copy_from_fields, discovery_failure, pass_context, CopyOptions};
use crate::error::EngineError;
use crate::matcher::{
    match_product, match_variants, ProductMatch, ProductMatchStrategy, VariantMatchKey,
};
use crate::result::{CopyCounts, CopyResult};
use crate::session::{MetafieldCache, StoreSession};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub copy: CopyOptions,
    /// Product strategies, tried in order.
    pub product_match: Vec<ProductMatchStrategy>,
    /// Also copy variant-level metafields between paired variants.
    pub variants: bool,
    pub variant_key: VariantMatchKey,
    /// Sync into receiver products that are not `active`.
    pub include_inactive: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            copy: CopyOptions::default(),
            product_match: ProductMatchStrategy::DEFAULT_ORDER.to_vec(),
            variants: false,
            variant_key: VariantMatchKey::default(),
            include_inactive: false,
        }
    }
}

/// What happened for one receiver store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverStatus {
    Synced {
        product_id: i64,
        strategy: ProductMatchStrategy,
    },
    NoMatch,
    Ambiguous {
        strategy: ProductMatchStrategy,
        candidates: usize,
    },
    Inactive {
        product_id: i64,
        status: String,
    },
    /// The receiver's product list could not be read.
    Unavailable {
        message: String,
    },
}

impl fmt::Display for ReceiverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synced {
                product_id,
                strategy,
            } => write!(f, "matched product {product_id} by {strategy}"),
            Self::NoMatch => f.write_str("no matching product"),
            Self::Ambiguous {
                strategy,
                candidates,
            } => write!(f, "no confident match ({candidates} candidates by {strategy})"),
            Self::Inactive { product_id, status } => {
                write!(f, "matched product {product_id} is {status}, skipped")
            }
            Self::Unavailable { message } => write!(f, "products unavailable: {message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariantSummary {
    pub matched: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone)]
pub struct ReceiverOutcome {
    pub receiver: String,
    pub status: ReceiverStatus,
    /// Present when variant-level sync ran.
    pub variants: Option<VariantSummary>,
    pub result: CopyResult,
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub donor_store: String,
    pub donor_product_id: i64,
    pub donor_title: String,
    pub receivers: Vec<ReceiverOutcome>,
}

impl SyncReport {
    /// Counters summed over every receiver.
    #[must_use]
    pub fn totals(&self) -> CopyCounts {
        let mut totals = CopyCounts::default();
        for outcome in &self.receivers {
            totals.merge(&outcome.result.counts);
        }
        totals
    }
}

/// Copies the donor product's metafields to its counterpart in each receiver.
///
/// Each receiver is handled independently: a receiver whose products cannot
/// be listed, that has no confident match, or whose match is inactive is
/// reported and the remaining receivers still run.
///
/// # Errors
///
/// Returns [`EngineError::ProductNotFound`] when the donor product does not
/// exist and [`EngineError::Shopify`] when it cannot be fetched.
pub async fn sync_product<D, R>(
    donor: &D,
    donor_product_id: i64,
    receivers: &mut [StoreSession<R>],
    cache: &MetafieldCache,
    options: &SyncOptions,
) -> Result<SyncReport, EngineError>
where
    D: CatalogStore,
    R: CatalogStore,
{
    let donor_product = donor
        .get_product(donor_product_id)
        .await?
        .ok_or_else(|| EngineError::ProductNotFound {
            store: donor.label().to_owned(),
            product_id: donor_product_id,
        })?;

    tracing::info!(
        store = donor.label(),
        product_id = donor_product.id,
        title = %donor_product.title,
        receivers = receivers.len(),
        dry_run = options.copy.dry_run,
        "starting sync"
    );

    let mut outcomes = Vec::with_capacity(receivers.len());
    for receiver in receivers.iter_mut() {
        outcomes.push(sync_into(donor, &donor_product, receiver, cache, options).await);
    }

    Ok(SyncReport {
        donor_store: donor.label().to_owned(),
        donor_product_id: donor_product.id,
        donor_title: donor_product.title.clone(),
        receivers: outcomes,
    })
}

async fn sync_into<D, R>(
    donor: &D,
    donor_product: &Product,
    receiver: &mut StoreSession<R>,
    cache: &MetafieldCache,
    options: &SyncOptions,
) -> ReceiverOutcome
where
    D: CatalogStore,
    R: CatalogStore,
{
    let label = receiver.label().to_owned();
    let mut result = CopyResult::default();

    let target = match receiver.products().await {
        Ok(products) => match match_product(donor_product, products, &options.product_match) {
            ProductMatch::Found { product, strategy } => Ok((product.clone(), strategy)),
            ProductMatch::Ambiguous {
                strategy,
                candidates,
            } => Err(ReceiverStatus::Ambiguous {
                strategy,
                candidates,
            }),
            ProductMatch::NotFound => Err(ReceiverStatus::NoMatch),
        },
        Err(err) => {
            result.counts.errors += 1;
            Err(ReceiverStatus::Unavailable {
                message: err.to_string(),
            })
        }
    };

    let (target, strategy) = match target {
        Ok(found) => found,
        Err(status) => return skipped(label, status, result),
    };

    if !target.is_active() && !options.include_inactive {
        let status = ReceiverStatus::Inactive {
            product_id: target.id,
            status: target.status.to_string(),
        };
        return skipped(label, status, result);
    }

    let status = ReceiverStatus::Synced {
        product_id: target.id,
        strategy,
    };
    tracing::info!(receiver = %label, %status, "receiver matched");
    result.line(format!("[{label}] {status}"));

    let donor_owner = Owner::product(donor_product.id);
    let receiver_owner = Owner::product(target.id);
    let product_pass = copy_owner(
        donor,
        donor_owner,
        receiver.store(),
        receiver_owner,
        cache,
        &options.copy,
    )
    .await;
    result.merge(product_pass);

    let variants = if options.variants {
        let pairing =
            match_variants(&donor_product.variants, &target.variants, options.variant_key);
        for unmatched in &pairing.unmatched {
            result.line(format!(
                "[{label}] donor variant {} ({}): no {} match",
                unmatched.id, unmatched.title, options.variant_key
            ));
        }
        for (donor_variant, receiver_variant) in &pairing.pairs {
            let pass = copy_owner(
                donor,
                Owner::variant(donor_variant.id),
                receiver.store(),
                Owner::variant(receiver_variant.id),
                cache,
                &options.copy,
            )
            .await;
            result.merge(pass);
        }
        Some(VariantSummary {
            matched: pairing.pairs.len(),
            unmatched: pairing.unmatched.len(),
        })
    } else {
        None
    };

    ReceiverOutcome {
        receiver: label,
        status,
        variants,
        result,
    }
}

async fn copy_owner<D, R>(
    donor: &D,
    donor_owner: Owner,
    receiver: &R,
    receiver_owner: Owner,
    cache: &MetafieldCache,
    options: &CopyOptions,
) -> CopyResult
where
    D: CatalogStore,
    R: CatalogStore,
{
    let context = pass_context(donor.label(), donor_owner, receiver.label(), receiver_owner);
    match cache.get_or_fetch(donor, donor_owner).await {
        Ok(fields) => copy_from_fields(&context, &fields, receiver, receiver_owner, options).await,
        Err(err) => discovery_failure(&context, "donor", &err.to_string()),
    }
}

fn skipped(label: String, status: ReceiverStatus, mut result: CopyResult) -> ReceiverOutcome {
    tracing::info!(receiver = %label, %status, "receiver skipped");
    result.line(format!("[{label}] {status}"));
    ReceiverOutcome {
        receiver: label,
        status,
        variants: None,
        result,
    }
}
