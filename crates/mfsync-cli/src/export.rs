//! `export`: a store's catalog and metafields as an `.xlsx` workbook.

use std::path::Path;
use std::time::Duration;

use mfsync_engine::{build_export, export_file_stem, write_export, ExportOptions};

use crate::context::Context;

pub(crate) async fn run_export(
    ctx: &Context,
    store: &str,
    category: Option<&str>,
    only_synced: bool,
    include_variants: bool,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let client = ctx.connect(store)?;
    let products = client.list_products().await?;

    let options = ExportOptions {
        category: category.map(str::to_owned),
        only_synced,
        include_variants,
        variant_delay: Duration::from_millis(ctx.write_delay_ms()),
    };
    let tables = build_export(&client, &products, &options).await;

    let stem = export_file_stem(store, category, chrono::Utc::now().date_naive());
    let path = write_export(&tables, out_dir, &stem)?;

    println!(
        "exported {} products from {}",
        tables.products.rows.len(),
        client.store_label()
    );
    if let Some(variants) = &tables.variants {
        println!("exported {} variants", variants.rows.len());
    }
    println!("wrote {}", path.display());
    Ok(())
}
