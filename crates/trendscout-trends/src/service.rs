//! End-to-end trend runs and read-side queries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use trendscout_core::{
    AppConfig, HistoryEntry, PersistedProduct, Region, RetryPolicy, RunConfig, ScoredItem,
};
use trendscout_scraper::{fetch_raw_listings, ListingSource};

use crate::enrich::{GeminiClient, NoopEnricher, TextEnricher};
use crate::error::{PipelineError, StoreError, TrendError};
use crate::interest::{HttpInterestClient, InterestSource, NoInterestSource};
use crate::notify::{DiscordNotifier, LogNotifier, Notifier, RunSummary};
use crate::pipeline::TrendPipeline;
use crate::reconcile::{ReconciliationStore, ReconciliationSummary};
use crate::store::ProductStore;

/// Outcome of one successful run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub region: Region,
    pub listings_scraped: usize,
    pub top_n: Vec<ScoredItem>,
    pub hot_count: usize,
    pub stored_count: usize,
    pub archived_count: u64,
    pub reconciliation: ReconciliationSummary,
    pub duration: Duration,
}

/// Wires acquisition, scoring, storage and notification together.
///
/// Callers guarantee at most one `run_once` is in flight at a time.
pub struct TrendService {
    source: Arc<dyn ListingSource>,
    interest: Arc<dyn InterestSource>,
    enricher: Arc<dyn TextEnricher>,
    store: Arc<dyn ProductStore>,
    notifier: Arc<dyn Notifier>,
    run_config: RunConfig,
}

impl TrendService {
    /// A service with no interest lookups, no text notes and log-only
    /// notifications.
    #[must_use]
    pub fn new(
        source: Arc<dyn ListingSource>,
        store: Arc<dyn ProductStore>,
        run_config: RunConfig,
    ) -> Self {
        Self {
            source,
            interest: Arc::new(NoInterestSource),
            enricher: Arc::new(NoopEnricher),
            store,
            notifier: Arc::new(LogNotifier),
            run_config,
        }
    }

    /// Builds the service from environment configuration, enabling each
    /// optional collaborator whose endpoint or key is set.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::Http`] if an HTTP client cannot be built.
    pub fn from_app_config(
        config: &AppConfig,
        store: Arc<dyn ProductStore>,
        source: Arc<dyn ListingSource>,
    ) -> Result<Self, TrendError> {
        let retry = RetryPolicy {
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        };
        let mut service = Self::new(source, store, RunConfig::from_app_config(config));

        if let Some(url) = config.interest_url.as_deref() {
            service = service.with_interest(Arc::new(HttpInterestClient::new(
                url,
                config.request_timeout_secs,
                retry,
            )?));
        } else {
            tracing::info!("no interest service configured; interest signals disabled");
        }

        if let Some(key) = config.gemini_api_key.as_deref() {
            service = service.with_enricher(Arc::new(GeminiClient::new(
                key,
                &config.gemini_model,
                config.request_timeout_secs,
                retry,
            )?));
        }

        if let Some(url) = config.discord_webhook_url.as_deref() {
            service = service.with_notifier(Arc::new(DiscordNotifier::new(
                url,
                config.request_timeout_secs,
                retry,
            )?));
        }

        Ok(service)
    }

    #[must_use]
    pub fn with_interest(mut self, interest: Arc<dyn InterestSource>) -> Self {
        self.interest = interest;
        self
    }

    #[must_use]
    pub fn with_enricher(mut self, enricher: Arc<dyn TextEnricher>) -> Self {
        self.enricher = enricher;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    /// Runs acquire, score, rank, reconcile, archive and notify once.
    ///
    /// `region` overrides the configured region for this run only. Run-fatal
    /// errors are sent to the error notification channel before being
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when no listings were acquired, nothing
    /// survived scoring, or categories could not be enumerated.
    pub async fn run_once(&self, region: Option<Region>) -> Result<RunResult, PipelineError> {
        let config = match region {
            Some(r) => self.run_config.for_region(r),
            None => self.run_config.clone(),
        };

        match self.execute(&config).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!(region = %config.region, error = %e, "trend run failed");
                if let Err(notify_err) = self.notifier.notify_error(&e.to_string()).await {
                    tracing::warn!(error = %notify_err, "failed to send error notification");
                }
                Err(e)
            }
        }
    }

    async fn execute(&self, config: &RunConfig) -> Result<RunResult, PipelineError> {
        let started = Instant::now();
        tracing::info!(region = %config.region, "starting trend run");

        let listings = fetch_raw_listings(
            self.source.as_ref(),
            config.region,
            config.products_per_category,
        )
        .await?;
        let listings_scraped = listings.len();

        let pipeline = TrendPipeline::new(self.interest.as_ref(), self.enricher.as_ref(), config);
        let output = pipeline.run(listings).await?;
        let hot_count = output.hot_count();

        let reconciliation = ReconciliationStore::new(self.store.as_ref())
            .reconcile(&output.top_n, config)
            .await;

        let summary = RunSummary {
            region: config.region,
            top_n: &output.top_n,
            hot_count,
            hot_threshold: config.hot_threshold,
        };
        if let Err(e) = self.notifier.notify_summary(&summary).await {
            tracing::warn!(error = %e, "failed to send run summary");
        }

        let duration = started.elapsed();
        tracing::info!(
            region = %config.region,
            listings = listings_scraped,
            top_n = output.top_n.len(),
            hot = hot_count,
            stored = reconciliation.succeeded,
            archived = reconciliation.archived,
            elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "trend run complete"
        );

        Ok(RunResult {
            region: config.region,
            listings_scraped,
            top_n: output.top_n,
            hot_count,
            stored_count: reconciliation.succeeded,
            archived_count: reconciliation.archived,
            reconciliation,
            duration,
        })
    }

    /// Top active products by stored score.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store query fails.
    pub async fn get_top(&self, limit: usize) -> Result<Vec<PersistedProduct>, StoreError> {
        self.store.top_by_score(limit).await
    }

    /// Score history for one product, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store query fails.
    pub async fn history(
        &self,
        product_id: i64,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        self.store.history(product_id, limit).await
    }

    /// Runs only the archival sweep with explicit bounds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the sweep fails.
    pub async fn archive_stale(
        &self,
        older_than_days: u32,
        score_below: f64,
    ) -> Result<u64, StoreError> {
        ReconciliationStore::new(self.store.as_ref())
            .archive_stale(older_than_days, score_below)
            .await
    }
}
