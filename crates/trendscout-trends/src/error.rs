use thiserror::Error;
use trendscout_core::{Region, Retriable};
use trendscout_db::DbError;
use trendscout_scraper::ScraperError;

/// Failure of a single outbound call made on behalf of one item or one
/// notification. Never fatal to a run.
#[derive(Debug, Error)]
pub enum TrendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {service}")]
    RateLimited { service: &'static str },

    #[error("unexpected HTTP status {status} from {service}")]
    UnexpectedStatus { status: u16, service: &'static str },

    #[error("invalid response from {service}: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },
}

impl Retriable for TrendError {
    fn is_retriable(&self) -> bool {
        match self {
            TrendError::Http(_) | TrendError::RateLimited { .. } => true,
            TrendError::UnexpectedStatus { status, .. } => *status >= 500,
            TrendError::InvalidResponse { .. } => false,
        }
    }
}

/// Failure at the product store seam.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("product {id} not found")]
    NotFound { id: i64 },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Run-fatal outcomes. Reported to the caller and the error notification
/// channel; never retried inside the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no listings acquired for region {region}")]
    NoListings { region: Region },

    #[error("no items survived scoring")]
    NoScoredItems,

    #[error("listing acquisition failed: {0}")]
    Acquisition(#[from] ScraperError),
}

/// Outcome of a run started through the `scan_runs` ledger.
#[derive(Debug, Error)]
pub enum TrackedRunError {
    /// Another process or task holds the scan lock.
    #[error("another scan run is already active")]
    Busy,

    #[error("failed to take the scan lock: {0}")]
    Lock(#[source] DbError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
