//! Read-mostly inspection commands: stores, products, metafields, sync flags
//! and variant match statistics.

use clap::Subcommand;
use mfsync_core::{coerce, MetafieldType};
use mfsync_engine::{
    filter_by_category, match_product, match_stats, parse_list, parse_strategy_order,
    ProductMatch, VariantMatchKey,
};
use mfsync_shopify::{
    get_sync_keys, index_by_namespace_key, list_metafields, set_sync_keys, upsert, CatalogStore,
    Owner, SyncFlagWrite,
};

use crate::args::OwnerArgs;
use crate::context::Context;

#[derive(Debug, Subcommand)]
pub enum StoresCommands {
    /// Connect to every configured store (or one) and print its shop name
    Check {
        /// Only check this store key
        #[arg(long)]
        store: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommands {
    /// List a store's products
    List {
        #[arg(long)]
        store: String,

        /// Only products of this product type
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum MetafieldsCommands {
    /// Print an owner's metafields with raw and coerced values
    Show {
        #[arg(long)]
        store: String,

        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// Create or update one metafield
    Set {
        #[arg(long)]
        store: String,

        #[command(flatten)]
        owner: OwnerArgs,

        #[arg(long)]
        namespace: String,

        #[arg(long)]
        key: String,

        #[arg(long)]
        value: String,

        /// Declared type, e.g. number_integer (default: single_line_text_field)
        #[arg(long = "type")]
        type_name: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SyncFlagsCommands {
    /// Print the keys marked for sync on an owner
    Get {
        #[arg(long)]
        store: String,

        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// Replace the keys marked for sync on an owner
    Set {
        #[arg(long)]
        store: String,

        #[command(flatten)]
        owner: OwnerArgs,

        /// Comma-separated keys; empty clears the set
        #[arg(long, allow_hyphen_values = true)]
        keys: String,
    },
}

pub(crate) async fn run_stores_check(ctx: &Context, only: Option<&str>) -> anyhow::Result<()> {
    let keys: Vec<&str> = match only {
        Some(key) => vec![ctx.stores.get(key)?.key.as_str()],
        None => ctx.stores.stores.iter().map(|s| s.key.as_str()).collect(),
    };

    let mut failed = 0usize;
    for key in &keys {
        let outcome = match ctx.connect(key) {
            Ok(client) => client.shop_info().await.map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(shop) => println!(
                "{key}: ok ({}{})",
                shop.name,
                shop.myshopify_domain
                    .map(|d| format!(", {d}"))
                    .unwrap_or_default()
            ),
            Err(e) => {
                tracing::error!(store = %key, error = %e, "store check failed");
                println!("{key}: FAILED ({e:#})");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} stores failed the check", keys.len());
    }
    Ok(())
}

pub(crate) async fn run_products_list(
    ctx: &Context,
    store: &str,
    category: Option<&str>,
) -> anyhow::Result<()> {
    let client = ctx.connect(store)?;
    let products = client.list_products().await?;
    let selected = filter_by_category(&products, category);
    for product in &selected {
        println!(
            "{}\t{}\t{}\t{}\t{} variants",
            product.id,
            product.status,
            product.handle,
            product.title,
            product.variants.len()
        );
    }
    println!("{} of {} products", selected.len(), products.len());
    Ok(())
}

pub(crate) async fn run_metafields_show(
    ctx: &Context,
    store: &str,
    owner: Owner,
) -> anyhow::Result<()> {
    let client = ctx.connect(store)?;
    let fields = list_metafields(&client, owner).await?;
    if fields.is_empty() {
        println!("{owner} has no metafields");
        return Ok(());
    }
    for field in &fields {
        let declared = field.declared_type();
        let coerced = match coerce(field.value.as_deref(), declared.as_ref()) {
            Ok(value) => value.to_wire(),
            Err(e) => format!("<{e}>"),
        };
        println!(
            "{} [{}] raw={:?} coerced={coerced:?}",
            field.qualified_key(),
            declared.as_ref().map_or("untyped", MetafieldType::as_wire),
            field.value.as_deref().unwrap_or_default(),
        );
    }
    Ok(())
}

pub(crate) async fn run_metafields_set(
    ctx: &Context,
    store: &str,
    owner: Owner,
    field: (&str, &str),
    value: &str,
    type_name: Option<&str>,
) -> anyhow::Result<()> {
    let (namespace, key) = field;
    let client = ctx.connect(store)?;
    let declared = MetafieldType::from_wire(type_name);
    let coerced = coerce(Some(value), declared.as_ref())?.to_wire();

    let mut index = index_by_namespace_key(&client.list_metafields(owner).await?);
    let action = upsert(
        &client,
        owner,
        namespace,
        key,
        declared.as_ref(),
        &coerced,
        &mut index,
    )
    .await?;
    println!("{namespace}.{key} on {owner}: {}", action.as_str());
    Ok(())
}

pub(crate) async fn run_sync_flags_get(
    ctx: &Context,
    store: &str,
    owner: Owner,
) -> anyhow::Result<()> {
    let client = ctx.connect(store)?;
    let keys = get_sync_keys(&client, owner).await?;
    if keys.is_empty() {
        println!("{owner}: no keys marked for sync");
    } else {
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        println!("{owner}: {}", keys.join(", "));
    }
    Ok(())
}

pub(crate) async fn run_sync_flags_set(
    ctx: &Context,
    store: &str,
    owner: Owner,
    keys: &str,
) -> anyhow::Result<()> {
    let client = ctx.connect(store)?;
    let keys = parse_list(keys);
    let outcome = set_sync_keys(&client, owner, &keys).await?;
    let verb = match outcome {
        SyncFlagWrite::Created => "created",
        SyncFlagWrite::Updated => "updated",
        SyncFlagWrite::Unchanged => "unchanged",
    };
    println!("{owner}: sync flags {verb} ({} keys)", keys.len());
    Ok(())
}

#[derive(Debug, Clone)]
pub struct MatchStatsRequest<'a> {
    pub donor: &'a str,
    pub donor_product: i64,
    pub receiver: &'a str,
    pub receiver_product: Option<i64>,
    pub key: VariantMatchKey,
    pub product_match: &'a str,
}

pub(crate) async fn run_match_stats(
    ctx: &Context,
    request: &MatchStatsRequest<'_>,
) -> anyhow::Result<()> {
    let donor_client = ctx.connect(request.donor)?;
    let receiver_client = ctx.connect(request.receiver)?;

    let donor = donor_client
        .get_product(request.donor_product)
        .await?
        .ok_or_else(|| {
            anyhow::anyhow!("product {} not found in {}", request.donor_product, request.donor)
        })?;

    let receiver = if let Some(id) = request.receiver_product {
        receiver_client
            .get_product(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("product {id} not found in {}", request.receiver))?
    } else {
        let order = parse_strategy_order(request.product_match)?;
        let candidates = receiver_client.list_products().await?;
        match match_product(&donor, &candidates, &order) {
            ProductMatch::Found { product, strategy } => {
                println!("matched receiver product {} by {strategy}", product.id);
                product.clone()
            }
            ProductMatch::Ambiguous {
                strategy,
                candidates,
            } => anyhow::bail!("no confident match: {candidates} candidates by {strategy}"),
            ProductMatch::NotFound => {
                anyhow::bail!("no product in {} matches {}", request.receiver, donor.title)
            }
        }
    };

    let stats = match_stats(&donor.variants, &receiver.variants, request.key);
    println!("{stats}");
    Ok(())
}
