//! The listing-acquisition seam.
//!
//! Every concrete producer of best-seller listings implements
//! [`ListingSource`]; the pipeline only ever sees the trait.

use async_trait::async_trait;
use trendscout_core::{RawListing, Region};

use crate::error::ScraperError;

#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Category names for `region`, in the order they should be fetched.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::UnknownRegion`] if the source has nothing for `region`.
    async fn categories(&self, region: Region) -> Result<Vec<String>, ScraperError>;

    /// Listings for a single category, at most `limit` of them, in page order.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] on any fetch or parse failure for this category.
    async fn fetch_category(
        &self,
        region: Region,
        category: &str,
        limit: usize,
    ) -> Result<Vec<RawListing>, ScraperError>;
}

/// Fetches every category of `region` in order and concatenates the results.
///
/// A failing category is logged and contributes nothing; the remaining
/// categories are still fetched. Only a failure to enumerate categories is
/// returned as an error.
///
/// # Errors
///
/// Returns [`ScraperError`] if `source.categories(region)` fails.
pub async fn fetch_raw_listings(
    source: &dyn ListingSource,
    region: Region,
    limit: usize,
) -> Result<Vec<RawListing>, ScraperError> {
    let categories = source.categories(region).await?;
    let total = categories.len();
    let mut listings = Vec::new();
    let mut failed = 0usize;

    for (idx, category) in categories.iter().enumerate() {
        tracing::info!(
            region = %region,
            category = %category,
            position = idx + 1,
            total,
            "fetching category"
        );
        match source.fetch_category(region, category, limit).await {
            Ok(mut items) => {
                tracing::info!(
                    region = %region,
                    category = %category,
                    count = items.len(),
                    "category fetched"
                );
                listings.append(&mut items);
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    region = %region,
                    category = %category,
                    error = %e,
                    "category fetch failed; continuing with remaining categories"
                );
            }
        }
    }

    tracing::info!(
        region = %region,
        listings = listings.len(),
        categories = total,
        failed_categories = failed,
        "listing acquisition complete"
    );

    Ok(listings)
}
