//! HTTP best-seller source.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use tokio::sync::Mutex;
use trendscout_core::{
    retry_with_backoff, AppConfig, RawListing, Region, RegionSource, RetryPolicy, SourcesFile,
};

use crate::error::ScraperError;
use crate::parse::parse_bestseller_page;
use crate::source::ListingSource;

/// Best-seller pages render this many items before pagination.
const ITEMS_PER_PAGE: usize = 50;
/// Pages fetched per category at most.
const MAX_PAGES: usize = 2;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Fetches and parses best-seller grids for the regions in a
/// [`SourcesFile`].
///
/// Requests are serialized per source: a randomized pause from
/// `page_spacing_ms` is inserted between consecutive page requests.
pub struct BestsellerSource {
    client: Client,
    sources: SourcesFile,
    retry: RetryPolicy,
    page_spacing_ms: (u64, u64),
    last_request: Mutex<Option<Instant>>,
}

impl BestsellerSource {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        sources: SourcesFile,
        timeout_secs: u64,
        user_agent: &str,
        retry: RetryPolicy,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            sources,
            retry,
            page_spacing_ms: (2_000, 5_000),
            last_request: Mutex::new(None),
        })
    }

    /// Builds a source from application config and a loaded catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn from_config(config: &AppConfig, sources: SourcesFile) -> Result<Self, ScraperError> {
        Self::new(
            sources,
            config.request_timeout_secs,
            &config.user_agent,
            RetryPolicy {
                max_retries: config.max_retries,
                backoff_base_ms: config.retry_backoff_base_ms,
            },
        )
    }

    /// Overrides the pause between page requests. `(0, 0)` disables it.
    #[must_use]
    pub fn with_page_spacing(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.page_spacing_ms = (min_ms, max_ms.max(min_ms));
        self
    }

    fn region_source(&self, region: Region) -> Result<&RegionSource, ScraperError> {
        self.sources
            .region(region)
            .ok_or(ScraperError::UnknownRegion { region })
    }

    async fn wait_for_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let (min, max) = self.page_spacing_ms;
            let spacing = if max > min {
                rand::rng().random_range(min..=max)
            } else {
                min
            };
            let target = Duration::from_millis(spacing);
            let elapsed = previous.elapsed();
            if elapsed < target {
                tokio::time::sleep(target - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn fetch_page(&self, url: &str, region: Region) -> Result<String, ScraperError> {
        self.wait_for_turn().await;

        let accept_language = match region {
            Region::Us => "en-US,en;q=0.9",
            Region::Uk => "en-GB,en;q=0.9,en-US;q=0.8",
        };

        retry_with_backoff(self.retry, "bestseller_page", || {
            let url = url.to_owned();
            async move {
                tracing::debug!(url = %url, "requesting best-seller page");
                let response = self
                    .client
                    .get(&url)
                    .header(
                        reqwest::header::ACCEPT,
                        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                    )
                    .header(reqwest::header::ACCEPT_LANGUAGE, accept_language)
                    .header(reqwest::header::CACHE_CONTROL, "max-age=0")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    return Err(ScraperError::RateLimited {
                        url,
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                Ok(response.text().await?)
            }
        })
        .await
    }
}

#[async_trait]
impl ListingSource for BestsellerSource {
    async fn categories(&self, region: Region) -> Result<Vec<String>, ScraperError> {
        let source = self.region_source(region)?;
        Ok(source.categories.iter().map(|c| c.name.clone()).collect())
    }

    async fn fetch_category(
        &self,
        region: Region,
        category: &str,
        limit: usize,
    ) -> Result<Vec<RawListing>, ScraperError> {
        let source = self.region_source(region)?;
        let category_config =
            source
                .category(category)
                .ok_or_else(|| ScraperError::UnknownCategory {
                    region,
                    category: category.to_string(),
                })?;
        let base_url = source.category_url(category_config);

        let mut listings: Vec<RawListing> = Vec::new();
        for page in 1..=MAX_PAGES {
            if listings.len() >= limit {
                break;
            }
            let url = if page == 1 {
                base_url.clone()
            } else {
                format!("{base_url}?pg={page}")
            };

            let html = match self.fetch_page(&url, region).await {
                Ok(html) => html,
                // Later pages are a bonus; keep what the first page gave us.
                Err(e) if page > 1 => {
                    tracing::warn!(url = %url, error = %e, "follow-up page failed");
                    break;
                }
                Err(e) => return Err(e),
            };

            let items = parse_bestseller_page(&html, source, category, listings.len());
            tracing::debug!(url = %url, count = items.len(), "parsed best-seller page");
            let page_len = items.len();
            listings.extend(items);

            if page_len < ITEMS_PER_PAGE {
                break;
            }
        }

        listings.truncate(limit);
        Ok(listings)
    }
}
