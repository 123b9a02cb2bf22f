//! JSON-file listing source for offline runs and fixtures.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use trendscout_core::{RawListing, Region};

use crate::error::ScraperError;
use crate::source::ListingSource;

/// Serves listings from a JSON array of [`RawListing`] on disk.
///
/// The file is region-agnostic: every region sees the same listings. It is
/// re-read on each call so edits take effect without a restart.
#[derive(Debug, Clone)]
pub struct FileListingSource {
    path: PathBuf,
}

impl FileListingSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<RawListing>, ScraperError> {
        let path = self.path.display().to_string();
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ScraperError::FileIo {
                path: path.clone(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| ScraperError::FileParse { path, source })
    }
}

#[async_trait]
impl ListingSource for FileListingSource {
    async fn categories(&self, _region: Region) -> Result<Vec<String>, ScraperError> {
        let listings = self.load().await?;
        let mut categories: Vec<String> = Vec::new();
        for listing in listings {
            if !categories.contains(&listing.category) {
                categories.push(listing.category);
            }
        }
        Ok(categories)
    }

    async fn fetch_category(
        &self,
        _region: Region,
        category: &str,
        limit: usize,
    ) -> Result<Vec<RawListing>, ScraperError> {
        let listings = self.load().await?;
        Ok(listings
            .into_iter()
            .filter(|l| l.category == category)
            .take(limit)
            .collect())
    }
}
