use std::path::PathBuf;

use mfsync_shopify::ShopifyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    #[error("product {product_id} not found in {store}")]
    ProductNotFound { store: String, product_id: i64 },

    #[error("unknown {kind} \"{value}\" (expected one of: {expected})")]
    UnknownOption {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("workbook error writing {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
