//! Write commands: cross-store `sync` and in-store `dedupe`.
//!
//! Per-receiver and per-pair failures are counted in the printed summaries;
//! the command exits non-zero when any were recorded.

use std::time::Duration;

use mfsync_core::AppConfig;
use mfsync_engine::{
    dedupe_titles, parse_strategy_order, sync_product, CopyCounts, DonorStrategy, MetafieldCache,
    StoreSession, SyncOptions, VariantMatchKey,
};

use crate::args::CopyArgs;
use crate::context::Context;

pub struct SyncRequest<'a> {
    pub donor: &'a str,
    pub product_id: i64,
    pub receivers: &'a [String],
    pub copy: &'a CopyArgs,
    pub product_match: &'a str,
    pub variants: bool,
    pub variant_key: VariantMatchKey,
    pub include_inactive: bool,
}

/// Receivers one `sync` run accepts.
pub const MAX_RECEIVERS: usize = 4;

pub(crate) async fn run_sync(ctx: &Context, request: &SyncRequest<'_>) -> anyhow::Result<()> {
    if request.receivers.is_empty() || request.receivers.len() > MAX_RECEIVERS {
        anyhow::bail!(
            "sync takes 1 to {MAX_RECEIVERS} receiver stores, got {}",
            request.receivers.len()
        );
    }
    if let Some(same) = request.receivers.iter().find(|r| r.eq_ignore_ascii_case(request.donor)) {
        anyhow::bail!("store '{same}' cannot be both donor and receiver");
    }

    let options = SyncOptions {
        copy: request.copy.to_options(ctx.write_delay_ms()),
        product_match: parse_strategy_order(request.product_match)?,
        variants: request.variants,
        variant_key: request.variant_key,
        include_inactive: request.include_inactive,
    };

    let donor = ctx.connect(request.donor)?;
    let mut receivers = Vec::with_capacity(request.receivers.len());
    for key in request.receivers {
        receivers.push(StoreSession::new(ctx.connect(key)?));
    }
    let cache = metafield_cache(&ctx.config);

    let report = sync_product(
        &donor,
        request.product_id,
        &mut receivers,
        &cache,
        &options,
    )
    .await?;

    println!(
        "{}sync {} product {} ({}) -> {} receivers",
        dry_run_prefix(options.copy.dry_run),
        report.donor_store,
        report.donor_product_id,
        report.donor_title,
        report.receivers.len()
    );
    for outcome in &report.receivers {
        println!();
        println!("== {}: {}", outcome.receiver, outcome.status);
        if let Some(variants) = outcome.variants {
            println!(
                "   variants: matched={} unmatched={}",
                variants.matched, variants.unmatched
            );
        }
        for line in &outcome.result.log {
            println!("{line}");
        }
        println!("{} {}", outcome.receiver, outcome.result.summary_line());
    }

    finish(report.totals())
}

pub(crate) async fn run_dedupe(
    ctx: &Context,
    store: &str,
    strategy: DonorStrategy,
    copy: &CopyArgs,
) -> anyhow::Result<()> {
    let options = copy.to_options(ctx.write_delay_ms());
    let mut session = StoreSession::new(ctx.connect(store)?);
    let report = dedupe_titles(&mut session, strategy, &options).await?;

    println!(
        "{}dedupe {}: {} duplicate title groups, donor by {strategy}",
        dry_run_prefix(options.dry_run),
        session.label(),
        report.groups
    );
    for pair in &report.pairs {
        println!();
        println!(
            "== {}: product {} -> product {}",
            pair.title, pair.donor_id, pair.receiver_id
        );
        for line in &pair.result.log {
            println!("{line}");
        }
    }

    finish(report.totals())
}

fn metafield_cache(config: &AppConfig) -> MetafieldCache {
    MetafieldCache::new(Duration::from_secs(config.metafield_cache_ttl_secs))
}

fn dry_run_prefix(dry_run: bool) -> &'static str {
    if dry_run {
        "dry-run: "
    } else {
        ""
    }
}

fn finish(totals: CopyCounts) -> anyhow::Result<()> {
    println!();
    println!("total: {totals}");
    if totals.errors > 0 {
        anyhow::bail!("finished with {} errors", totals.errors);
    }
    Ok(())
}
