pub mod copy;
pub mod dedupe;
pub mod error;
pub mod export;
pub mod filter;
pub mod matcher;
pub mod result;
pub mod session;
pub mod stats;
pub mod sync;

pub use copy::{copy_from_fields, copy_metafields, pass_context, CopyOptions, DEFAULT_WRITE_DELAY};
pub use dedupe::{dedupe_titles, duplicate_groups, DedupePair, DedupeReport, DonorStrategy};
pub use error::EngineError;
pub use export::{
    build_export, export_file_stem, filter_by_category, sanitize_category, write_export,
    ExportOptions, ExportTables, Table, PRODUCTS_SHEET, VARIANTS_SHEET,
};
pub use filter::{parse_list, CopyFilter, FilterVerdict};
pub use matcher::{
    match_product, match_variants, normalize_title, parse_strategy_order, MatchKey, ProductMatch,
    ProductMatchStrategy, VariantMatchKey, VariantPairing,
};
pub use result::{CopyCounts, CopyResult};
pub use session::{MetafieldCache, StoreSession};
pub use stats::{match_stats, MatchStats, SideStats};
pub use sync::{
    sync_product, ReceiverOutcome, ReceiverStatus, SyncOptions, SyncReport, VariantSummary,
};
