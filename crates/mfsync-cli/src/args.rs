//! Argument groups shared by several subcommands.

use std::time::Duration;

use clap::Args;
use mfsync_engine::{parse_list, CopyFilter, CopyOptions};
use mfsync_shopify::Owner;

/// Exactly one of `--product` / `--variant`.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct OwnerArgs {
    /// Product id
    #[arg(long)]
    pub product: Option<i64>,

    /// Variant id
    #[arg(long)]
    pub variant: Option<i64>,
}

impl OwnerArgs {
    pub fn owner(&self) -> anyhow::Result<Owner> {
        match (self.product, self.variant) {
            (Some(id), None) => Ok(Owner::product(id)),
            (None, Some(id)) => Ok(Owner::variant(id)),
            _ => anyhow::bail!("pass exactly one of --product or --variant"),
        }
    }
}

/// Field selection and write behaviour of a copy pass.
#[derive(Debug, Clone, Default, Args)]
pub struct CopyArgs {
    /// Comma-separated namespaces to copy (default: all)
    #[arg(long)]
    pub namespaces: Option<String>,

    /// Comma-separated keys or namespace.key entries to copy
    #[arg(long)]
    pub include: Option<String>,

    /// Comma-separated keys or namespace.key entries to leave out
    #[arg(long)]
    pub exclude: Option<String>,

    /// Only copy keys listed in the donor's sync flags
    #[arg(long)]
    pub only_synced: bool,

    /// Replace values already set on the receiver
    #[arg(long)]
    pub overwrite: bool,

    /// Report what would be written without writing
    #[arg(long)]
    pub dry_run: bool,
}

impl CopyArgs {
    pub fn to_options(&self, write_delay_ms: u64) -> CopyOptions {
        let list = |raw: &Option<String>| raw.as_deref().map(parse_list).unwrap_or_default();
        CopyOptions {
            filter: CopyFilter {
                namespaces: list(&self.namespaces),
                include: list(&self.include),
                exclude: list(&self.exclude),
                only_synced: self.only_synced,
            },
            overwrite: self.overwrite,
            dry_run: self.dry_run,
            write_delay: Duration::from_millis(write_delay_ms),
        }
    }
}
