use thiserror::Error;
use trendscout_core::{Region, Retriable};

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("no source configured for region {region}")]
    UnknownRegion { region: Region },

    #[error("region {region} has no category named '{category}'")]
    UnknownCategory { region: Region, category: String },

    #[error("failed to read listings file {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse listings file {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Retriable for ScraperError {
    /// 429, 5xx and network-level failures are transient. Everything else
    /// (404, other 4xx, configuration and file errors) would fail the same
    /// way on a second attempt.
    fn is_retriable(&self) -> bool {
        match self {
            ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
            ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
