//! Merges a run's top-N into the product store.

use trendscout_core::{NewProduct, ProductUpdate, RunConfig, ScoredItem};

use crate::error::StoreError;
use crate::store::ProductStore;

/// Per-run reconciliation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub archived: u64,
}

enum Merge {
    Inserted,
    Updated,
}

pub struct ReconciliationStore<'a> {
    store: &'a dyn ProductStore,
}

impl<'a> ReconciliationStore<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ProductStore) -> Self {
        Self { store }
    }

    /// Upserts each item by exact name and appends one history entry per
    /// successful merge, then runs the archival sweep.
    ///
    /// Item failures are logged and counted; they never abort the batch.
    pub async fn reconcile(&self, top_n: &[ScoredItem], config: &RunConfig) -> ReconciliationSummary {
        let mut summary = ReconciliationSummary {
            attempted: top_n.len(),
            ..ReconciliationSummary::default()
        };

        for item in top_n {
            match self.merge(item).await {
                Ok(Merge::Inserted) => {
                    summary.succeeded += 1;
                    summary.inserted += 1;
                }
                Ok(Merge::Updated) => {
                    summary.succeeded += 1;
                    summary.updated += 1;
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(product = %item.name, error = %e, "failed to store product");
                }
            }
        }

        summary.archived = match self
            .archive_stale(config.archive_after_days, config.archive_score_below)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, "archival sweep failed");
                0
            }
        };

        tracing::info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            inserted = summary.inserted,
            updated = summary.updated,
            archived = summary.archived,
            "reconciliation complete"
        );
        summary
    }

    /// Archives active products older than `older_than_days` scoring below
    /// `score_below`, independent of any run's item set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the sweep fails.
    pub async fn archive_stale(
        &self,
        older_than_days: u32,
        score_below: f64,
    ) -> Result<u64, StoreError> {
        let archived = self.store.archive_stale(older_than_days, score_below).await?;
        if archived > 0 {
            tracing::info!(archived, older_than_days, score_below, "archived stale products");
        }
        Ok(archived)
    }

    async fn merge(&self, item: &ScoredItem) -> Result<Merge, StoreError> {
        let (product, merge) = match self.store.find_by_name(&item.name).await? {
            Some(existing) => {
                let updated = self
                    .store
                    .update(existing.id, &ProductUpdate::from(item))
                    .await?;
                tracing::debug!(id = updated.id, product = %item.name, "updated product");
                (updated, Merge::Updated)
            }
            None => {
                let inserted = self.store.insert(&NewProduct::from(item)).await?;
                tracing::debug!(id = inserted.id, product = %item.name, "inserted product");
                (inserted, Merge::Inserted)
            }
        };

        self.store
            .append_history(product.id, product.trend_score, product.search_volume)
            .await?;
        Ok(merge)
    }
}
