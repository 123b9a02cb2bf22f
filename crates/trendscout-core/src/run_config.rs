use std::time::Duration;

use crate::app_config::AppConfig;
use crate::region::Region;

/// Parameters for one pipeline invocation.
///
/// Passed explicitly into every run; there is no process-wide region or
/// threshold state.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub region: Region,
    pub products_per_category: usize,
    /// How many of the ranked items are persisted and reported.
    pub top_n_limit: usize,
    pub hot_threshold: f64,
    /// Minimum score before a text note is requested.
    pub ai_threshold: f64,
    /// Number of best-ranked listings that get an interest lookup.
    pub lookup_budget: usize,
    /// Inclusive bounds of the randomized pause between lookups.
    pub lookup_spacing_ms: (u64, u64),
    pub archive_after_days: u32,
    pub archive_score_below: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            region: Region::Us,
            products_per_category: 50,
            top_n_limit: 10,
            hot_threshold: 70.0,
            ai_threshold: 60.0,
            lookup_budget: 15,
            lookup_spacing_ms: (1_000, 3_000),
            archive_after_days: 30,
            archive_score_below: 50.0,
        }
    }
}

impl RunConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let min = config.lookup_spacing_min_ms;
        let max = config.lookup_spacing_max_ms.max(min);
        Self {
            region: config.region,
            products_per_category: config.products_per_category,
            top_n_limit: config.top_n_limit,
            hot_threshold: config.hot_threshold,
            ai_threshold: config.ai_threshold,
            lookup_budget: config.lookup_budget,
            lookup_spacing_ms: (min, max),
            archive_after_days: config.archive_after_days,
            archive_score_below: config.archive_score_below,
        }
    }

    /// Same configuration, different region.
    #[must_use]
    pub fn for_region(&self, region: Region) -> Self {
        Self {
            region,
            ..self.clone()
        }
    }

    /// Picks a pause length within `lookup_spacing_ms`.
    #[must_use]
    pub fn lookup_spacing(&self) -> Duration {
        use rand::Rng;

        let (min, max) = self.lookup_spacing_ms;
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}
