//! Shared domain types and configuration for trendscout.
//!
//! Everything here is plain data plus env/YAML parsing; no network or
//! database access happens in this crate.

pub mod app_config;
pub mod config;
pub mod listings;
pub mod products;
pub mod region;
pub mod retry;
pub mod run_config;
pub mod sources;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use listings::{InterestSummary, RawListing, ScoredItem};
pub use products::{HistoryEntry, NewProduct, PersistedProduct, ProductStatus, ProductUpdate};
pub use region::Region;
pub use retry::{retry_with_backoff, Retriable, RetryPolicy};
pub use run_config::RunConfig;
pub use sources::{load_sources, CategoryConfig, RegionSource, SourcesFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),

    #[error("sources validation failed: {0}")]
    Validation(String),
}
