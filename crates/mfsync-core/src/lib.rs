//! Shared configuration and metafield value model for the `mfsync` tools.

pub mod app_config;
pub mod config;
pub mod metafield_type;
pub mod stores;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use metafield_type::{coerce, CoerceError, CoercedValue, MetafieldType};
pub use stores::{load_stores, StoreConfig, StoreCredentials, StoresFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read stores file {path}: {source}")]
    StoresFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse stores file: {0}")]
    StoresFileParse(#[from] serde_yaml::Error),

    #[error("stores file validation failed: {0}")]
    Validation(String),

    #[error("unknown store '{0}'")]
    UnknownStore(String),
}
