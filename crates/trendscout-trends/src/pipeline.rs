//! Listing → ranked, classified items.

use std::collections::HashSet;

use trendscout_core::{RawListing, RunConfig, ScoredItem};

use crate::enrich::TextEnricher;
use crate::error::PipelineError;
use crate::interest::InterestSource;
use crate::scheduler::EnrichmentScheduler;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Every scored item, best first; ties keep input order.
    pub ranked: Vec<ScoredItem>,
    /// The first `top_n_limit` of `ranked`.
    pub top_n: Vec<ScoredItem>,
    /// Items of `ranked` at or above `hot_threshold`, whether or not they
    /// made `top_n`.
    pub hot: Vec<ScoredItem>,
}

impl PipelineOutput {
    #[must_use]
    pub fn hot_count(&self) -> usize {
        self.hot.len()
    }
}

pub struct TrendPipeline<'a> {
    scheduler: EnrichmentScheduler<'a>,
    config: &'a RunConfig,
}

impl<'a> TrendPipeline<'a> {
    #[must_use]
    pub fn new(
        interest: &'a dyn InterestSource,
        enricher: &'a dyn TextEnricher,
        config: &'a RunConfig,
    ) -> Self {
        Self {
            scheduler: EnrichmentScheduler::new(interest, enricher, config),
            config,
        }
    }

    /// Scores, ranks and classifies `listings`.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::NoListings`] when `listings` is empty.
    /// - [`PipelineError::NoScoredItems`] when nothing survives to be scored.
    pub async fn run(&self, listings: Vec<RawListing>) -> Result<PipelineOutput, PipelineError> {
        if listings.is_empty() {
            return Err(PipelineError::NoListings {
                region: self.config.region,
            });
        }

        let candidates = dedupe_listings(listings);
        let scored = self.scheduler.score_all(&candidates).await;
        if scored.is_empty() {
            return Err(PipelineError::NoScoredItems);
        }

        let output = select_ranked(scored, self.config.top_n_limit, self.config.hot_threshold);
        tracing::info!(
            scored = output.ranked.len(),
            top_n = output.top_n.len(),
            hot = output.hot_count(),
            best = output.ranked.first().map_or(0.0, |i| i.trend_score),
            "ranking complete"
        );
        Ok(output)
    }
}

/// Drops listings with a blank name and later duplicates of a name.
fn dedupe_listings(listings: Vec<RawListing>) -> Vec<RawListing> {
    let total = listings.len();
    let mut seen = HashSet::new();
    let kept: Vec<RawListing> = listings
        .into_iter()
        .filter(|l| {
            if l.name.trim().is_empty() {
                tracing::warn!(url = %l.url, "dropping listing with empty name");
                return false;
            }
            seen.insert(l.name.clone())
        })
        .collect();

    if kept.len() < total {
        tracing::info!(
            dropped = total - kept.len(),
            kept = kept.len(),
            "filtered blank and duplicate listings"
        );
    }
    kept
}

/// Sorts by score (stable, descending) and picks `top_n` and the hot set.
#[must_use]
pub fn select_ranked(mut scored: Vec<ScoredItem>, top_n: usize, hot_threshold: f64) -> PipelineOutput {
    scored.sort_by(|a, b| b.trend_score.total_cmp(&a.trend_score));

    let hot: Vec<ScoredItem> = scored
        .iter()
        .filter(|i| i.is_hot(hot_threshold))
        .cloned()
        .collect();
    let top: Vec<ScoredItem> = scored.iter().take(top_n).cloned().collect();

    PipelineOutput {
        ranked: scored,
        top_n: top,
        hot,
    }
}
