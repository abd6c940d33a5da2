mod args;
mod catalog;
mod context;
mod export;
mod sync;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mfsync_engine::{DonorStrategy, VariantMatchKey};
use tracing_subscriber::EnvFilter;

use crate::args::CopyArgs;
use crate::catalog::{
    MatchStatsRequest, MetafieldsCommands, ProductsCommands, StoresCommands, SyncFlagsCommands,
};
use crate::context::Context;
use crate::sync::SyncRequest;

#[derive(Debug, Parser)]
#[command(name = "mfsync")]
#[command(about = "Copy Shopify metafields between stores")]
struct Cli {
    /// Stores file (overrides MFSYNC_STORES_PATH)
    #[arg(long, global = true)]
    stores: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Configured stores
    Stores {
        #[command(subcommand)]
        command: StoresCommands,
    },
    /// Store products
    Products {
        #[command(subcommand)]
        command: ProductsCommands,
    },
    /// Inspect or edit metafields of one product or variant
    Metafields {
        #[command(subcommand)]
        command: MetafieldsCommands,
    },
    /// Keys marked for cross-store sync
    SyncFlags {
        #[command(subcommand)]
        command: SyncFlagsCommands,
    },
    /// Report how well variants of two products pair up
    MatchStats {
        #[arg(long)]
        donor: String,

        #[arg(long)]
        donor_product: i64,

        #[arg(long)]
        receiver: String,

        /// Receiver product id (default: find it with --match)
        #[arg(long)]
        receiver_product: Option<i64>,

        /// Variant attribute to pair on
        #[arg(long, default_value = "barcode")]
        key: VariantMatchKey,

        /// Product match strategies, in order
        #[arg(long = "match", default_value = "barcode,handle,title")]
        product_match: String,
    },
    /// Copy a donor product's metafields to its counterparts in other stores
    Sync {
        /// Donor store key
        #[arg(long)]
        from: String,

        /// Donor product id
        #[arg(long)]
        product: i64,

        /// Receiver store keys (1 to 4)
        #[arg(long = "to", required = true, num_args = 1..=4)]
        receivers: Vec<String>,

        #[command(flatten)]
        copy: CopyArgs,

        /// Product match strategies, in order
        #[arg(long = "match", default_value = "barcode,handle,title")]
        product_match: String,

        /// Also copy variant metafields between paired variants
        #[arg(long)]
        variants: bool,

        /// Variant attribute to pair on
        #[arg(long, default_value = "barcode")]
        variant_key: VariantMatchKey,

        /// Sync into receiver products that are draft or archived
        #[arg(long)]
        include_inactive: bool,
    },
    /// Consolidate metafields across same-titled products in one store
    Dedupe {
        #[arg(long)]
        store: String,

        /// most-metafields, oldest-id or newest-id
        #[arg(long, default_value = "most-metafields")]
        strategy: DonorStrategy,

        #[command(flatten)]
        copy: CopyArgs,
    },
    /// Write a store's products, variants and metafields to an .xlsx workbook
    Export {
        #[arg(long)]
        store: String,

        /// Only products of this product type
        #[arg(long)]
        category: Option<String>,

        /// Only metafields listed in each owner's sync flags
        #[arg(long)]
        only_synced: bool,

        /// Leave the Variants sheet empty
        #[arg(long)]
        no_variants: bool,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("mfsync: no command given; see --help");
        return Ok(());
    };

    dotenvy::dotenv().ok();
    let config = mfsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::load(config, cli.stores)?;

    match command {
        Commands::Stores {
            command: StoresCommands::Check { store },
        } => catalog::run_stores_check(&ctx, store.as_deref()).await,
        Commands::Products {
            command: ProductsCommands::List { store, category },
        } => catalog::run_products_list(&ctx, &store, category.as_deref()).await,
        Commands::Metafields { command } => match command {
            MetafieldsCommands::Show { store, owner } => {
                catalog::run_metafields_show(&ctx, &store, owner.owner()?).await
            }
            MetafieldsCommands::Set {
                store,
                owner,
                namespace,
                key,
                value,
                type_name,
            } => {
                catalog::run_metafields_set(
                    &ctx,
                    &store,
                    owner.owner()?,
                    (&namespace, &key),
                    &value,
                    type_name.as_deref(),
                )
                .await
            }
        },
        Commands::SyncFlags { command } => match command {
            SyncFlagsCommands::Get { store, owner } => {
                catalog::run_sync_flags_get(&ctx, &store, owner.owner()?).await
            }
            SyncFlagsCommands::Set { store, owner, keys } => {
                catalog::run_sync_flags_set(&ctx, &store, owner.owner()?, &keys).await
            }
        },
        Commands::MatchStats {
            donor,
            donor_product,
            receiver,
            receiver_product,
            key,
            product_match,
        } => {
            let request = MatchStatsRequest {
                donor: &donor,
                donor_product,
                receiver: &receiver,
                receiver_product,
                key,
                product_match: &product_match,
            };
            catalog::run_match_stats(&ctx, &request).await
        }
        Commands::Sync {
            from,
            product,
            receivers,
            copy,
            product_match,
            variants,
            variant_key,
            include_inactive,
        } => {
            let request = SyncRequest {
                donor: &from,
                product_id: product,
                receivers: &receivers,
                copy: &copy,
                product_match: &product_match,
                variants,
                variant_key,
                include_inactive,
            };
            sync::run_sync(&ctx, &request).await
        }
        Commands::Dedupe {
            store,
            strategy,
            copy,
        } => sync::run_dedupe(&ctx, &store, strategy, &copy).await,
        Commands::Export {
            store,
            category,
            only_synced,
            no_variants,
            out_dir,
        } => {
            export::run_export(
                &ctx,
                &store,
                category.as_deref(),
                only_synced,
                !no_variants,
                &out_dir,
            )
            .await
        }
    }
}
