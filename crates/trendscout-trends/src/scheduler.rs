//! Decides which listings pay for an interest lookup and a text note.
//!
//! Only the `lookup_budget` best-ranked listings get a lookup, serialized
//! with a randomized pause between calls. Everything else is scored from
//! rank and price alone. Any item scoring at or above `ai_threshold` asks
//! the enricher for a note. A failed lookup or note only degrades that item.

use trendscout_core::{InterestSummary, RawListing, RunConfig, ScoredItem};

use crate::enrich::TextEnricher;
use crate::interest::InterestSource;
use crate::keyword::clean_keyword;
use crate::scorer::{round2, score};

/// Sort key for listings without a rank: after every ranked listing.
const UNRANKED: u32 = u32::MAX;

pub struct EnrichmentScheduler<'a> {
    interest: &'a dyn InterestSource,
    enricher: &'a dyn TextEnricher,
    config: &'a RunConfig,
}

impl<'a> EnrichmentScheduler<'a> {
    #[must_use]
    pub fn new(
        interest: &'a dyn InterestSource,
        enricher: &'a dyn TextEnricher,
        config: &'a RunConfig,
    ) -> Self {
        Self {
            interest,
            enricher,
            config,
        }
    }

    /// Scores every listing. The output is in input order, one item per
    /// listing.
    pub async fn score_all(&self, listings: &[RawListing]) -> Vec<ScoredItem> {
        let interests = self.lookup_head(listings).await;

        let mut scored = Vec::with_capacity(listings.len());
        for (idx, (listing, interest)) in listings.iter().zip(interests).enumerate() {
            let item = self.score_one(listing, interest.as_ref()).await;
            tracing::info!(
                position = idx + 1,
                total = listings.len(),
                product = %truncate_for_log(&item.name),
                score = item.trend_score,
                volume = item.search_volume,
                "scored listing"
            );
            scored.push(item);
        }
        scored
    }

    /// Indices of the listings that get a lookup, best rank first.
    fn head_indices(&self, listings: &[RawListing]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..listings.len()).collect();
        order.sort_by_key(|&i| listings[i].rank.unwrap_or(UNRANKED));
        order.truncate(self.config.lookup_budget);
        order
    }

    async fn lookup_head(&self, listings: &[RawListing]) -> Vec<Option<InterestSummary>> {
        let mut interests = vec![None; listings.len()];
        let mut performed = 0usize;

        for idx in self.head_indices(listings) {
            let listing = &listings[idx];
            let Some(keyword) = clean_keyword(&listing.name) else {
                tracing::debug!(product = %listing.name, "keyword too short; skipping lookup");
                continue;
            };

            if performed > 0 {
                tokio::time::sleep(self.config.lookup_spacing()).await;
            }
            performed += 1;

            match self.interest.lookup(&keyword, self.config.region).await {
                Ok(summary) => interests[idx] = summary,
                Err(e) => tracing::warn!(
                    keyword = %keyword,
                    error = %e,
                    "interest lookup failed; scoring without it"
                ),
            }
        }

        tracing::info!(
            lookups = performed,
            budget = self.config.lookup_budget,
            listings = listings.len(),
            "interest lookups complete"
        );
        interests
    }

    async fn score_one(
        &self,
        listing: &RawListing,
        interest: Option<&InterestSummary>,
    ) -> ScoredItem {
        let interest = InterestSummary::with_data(interest);
        let trend_score = round2(score(listing, interest));

        let ai_note = if trend_score >= self.config.ai_threshold {
            match self
                .enricher
                .enrich(&listing.name, &listing.category, listing.price, trend_score)
                .await
            {
                Ok(note) => note,
                Err(e) => {
                    tracing::warn!(
                        product = %listing.name,
                        error = %e,
                        "text enrichment failed; continuing without note"
                    );
                    None
                }
            }
        } else {
            None
        };

        let notes = compose_notes(interest, ai_note.as_deref());

        ScoredItem {
            name: listing.name.clone(),
            category: listing.category.clone(),
            url: listing.url.clone(),
            price: listing.price,
            rank: listing.rank,
            trend_score,
            search_volume: interest.map_or(0, |i| i.current_volume),
            ai_note,
            notes,
        }
    }
}

fn compose_notes(interest: Option<&InterestSummary>, ai_note: Option<&str>) -> Option<String> {
    // `{:?}` keeps a decimal point on whole numbers: 60.0, 12.35.
    let velocity = interest.map(|i| format!("Velocity: {:?}%", i.velocity));
    match (velocity, ai_note) {
        (Some(v), Some(note)) => Some(format!("{v}\n\nAI Insight: {note}")),
        (None, Some(note)) => Some(format!("AI Insight: {note}")),
        (v, None) => v,
    }
}

fn truncate_for_log(name: &str) -> String {
    name.chars().take(40).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use trendscout_core::Region;

    use super::*;
    use crate::error::TrendError;

    /// Records every keyword it is asked about; answers from a fixed map.
    #[derive(Default)]
    struct RecordingInterest {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
        volume: i32,
        velocity: f64,
    }

    #[async_trait]
    impl InterestSource for RecordingInterest {
        async fn lookup(
            &self,
            keyword: &str,
            _region: Region,
        ) -> Result<Option<InterestSummary>, TrendError> {
            self.calls.lock().unwrap().push(keyword.to_string());
            if self.fail_on == Some(keyword) {
                return Err(TrendError::RateLimited { service: "test" });
            }
            Ok(Some(InterestSummary {
                keyword: keyword.to_string(),
                current_volume: self.volume,
                average_volume: self.volume,
                max_volume: self.volume,
                velocity: self.velocity,
                has_data: true,
            }))
        }
    }

    #[derive(Default)]
    struct RecordingEnricher {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl TextEnricher for RecordingEnricher {
        async fn enrich(
            &self,
            name: &str,
            _category: &str,
            _price: Option<f64>,
            _score: f64,
        ) -> Result<Option<String>, TrendError> {
            self.calls.lock().unwrap().push(name.to_string());
            if self.fail {
                return Err(TrendError::UnexpectedStatus {
                    status: 500,
                    service: "test",
                });
            }
            Ok(Some(format!("note for {name}")))
        }
    }

    fn listing(name: &str, rank: Option<u32>, price: Option<f64>) -> RawListing {
        RawListing {
            name: name.to_string(),
            category: "Home".to_string(),
            url: format!("https://example.com/dp/{name}"),
            price,
            rank,
        }
    }

    fn config(budget: usize) -> RunConfig {
        RunConfig {
            lookup_budget: budget,
            lookup_spacing_ms: (0, 0),
            ..RunConfig::default()
        }
    }

    #[tokio::test]
    async fn only_best_ranked_listings_are_looked_up() {
        let interest = RecordingInterest::default();
        let enricher = RecordingEnricher::default();
        let cfg = config(2);
        let listings = vec![
            listing("Unranked Lamp", None, None),
            listing("Third Kettle", Some(3), None),
            listing("First Blender", Some(1), None),
            listing("Second Toaster", Some(2), None),
        ];

        let scored = EnrichmentScheduler::new(&interest, &enricher, &cfg)
            .score_all(&listings)
            .await;

        assert_eq!(
            *interest.calls.lock().unwrap(),
            vec!["first blender", "second toaster"]
        );
        let names: Vec<&str> = scored.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Unranked Lamp", "Third Kettle", "First Blender", "Second Toaster"]
        );
    }

    #[tokio::test]
    async fn unranked_listings_are_looked_up_last() {
        let interest = RecordingInterest::default();
        let enricher = RecordingEnricher::default();
        let cfg = config(10);
        let listings = vec![
            listing("Unranked Lamp", None, None),
            listing("Ranked Kettle", Some(40), None),
        ];

        EnrichmentScheduler::new(&interest, &enricher, &cfg)
            .score_all(&listings)
            .await;

        assert_eq!(
            *interest.calls.lock().unwrap(),
            vec!["ranked kettle", "unranked lamp"]
        );
    }

    #[tokio::test]
    async fn lookup_data_feeds_score_volume_and_notes() {
        let interest = RecordingInterest {
            volume: 20,
            velocity: 60.0,
            ..RecordingInterest::default()
        };
        let enricher = RecordingEnricher::default();
        let cfg = RunConfig {
            ai_threshold: 101.0,
            ..config(1)
        };

        let scored = EnrichmentScheduler::new(&interest, &enricher, &cfg)
            .score_all(&[listing("Looked Up Mug", Some(1), Some(30.0))])
            .await;

        // 20 (velocity) + 5 (volume) + 30 + 20 + 10 (competition)
        assert!((scored[0].trend_score - 85.0).abs() < 1e-9);
        assert_eq!(scored[0].search_volume, 20);
        assert_eq!(scored[0].notes.as_deref(), Some("Velocity: 60.0%"));
        assert!(scored[0].ai_note.is_none());
    }

    #[tokio::test]
    async fn failed_lookup_degrades_only_that_item() {
        let interest = RecordingInterest {
            fail_on: Some("broken lookup"),
            volume: 20,
            velocity: 60.0,
            ..RecordingInterest::default()
        };
        let enricher = RecordingEnricher::default();
        let cfg = RunConfig {
            ai_threshold: 101.0,
            ..config(5)
        };

        let scored = EnrichmentScheduler::new(&interest, &enricher, &cfg)
            .score_all(&[
                listing("Broken Lookup", Some(1), Some(30.0)),
                listing("Healthy Lookup", Some(2), Some(30.0)),
            ])
            .await;

        assert!((scored[0].trend_score - 65.0).abs() < 1e-9);
        assert_eq!(scored[0].search_volume, 0);
        assert!(scored[0].notes.is_none());
        assert!((scored[1].trend_score - 85.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn notes_requested_at_threshold_for_head_and_tail() {
        let interest = RecordingInterest::default();
        let enricher = RecordingEnricher::default();
        let cfg = config(0);

        let scored = EnrichmentScheduler::new(&interest, &enricher, &cfg)
            .score_all(&[
                listing("Top Seller Bottle", Some(1), Some(30.0)),
                listing("Cheap Trinket Set", Some(60), Some(5.0)),
            ])
            .await;

        assert!(interest.calls.lock().unwrap().is_empty());
        assert_eq!(*enricher.calls.lock().unwrap(), vec!["Top Seller Bottle"]);
        assert_eq!(
            scored[0].notes.as_deref(),
            Some("AI Insight: note for Top Seller Bottle")
        );
        assert!(scored[1].ai_note.is_none());
    }

    #[tokio::test]
    async fn failed_enrichment_keeps_score() {
        let interest = RecordingInterest::default();
        let enricher = RecordingEnricher {
            fail: true,
            ..RecordingEnricher::default()
        };
        let cfg = config(0);

        let scored = EnrichmentScheduler::new(&interest, &enricher, &cfg)
            .score_all(&[listing("Top Seller Bottle", Some(1), Some(30.0))])
            .await;

        assert!((scored[0].trend_score - 65.0).abs() < 1e-9);
        assert!(scored[0].ai_note.is_none());
    }

    #[tokio::test]
    async fn short_keywords_skip_lookup_without_spacing() {
        let interest = RecordingInterest::default();
        let enricher = RecordingEnricher::default();
        let cfg = RunConfig {
            lookup_spacing_ms: (5_000, 5_000),
            ..config(5)
        };

        let started = std::time::Instant::now();
        EnrichmentScheduler::new(&interest, &enricher, &cfg)
            .score_all(&[listing("TV 4K", Some(1), None), listing("Desk Lamp", Some(2), None)])
            .await;

        assert_eq!(*interest.calls.lock().unwrap(), vec!["desk lamp"]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn notes_combine_velocity_and_insight() {
        let interest = InterestSummary {
            keyword: "k".to_string(),
            current_volume: 1,
            average_volume: 1,
            max_volume: 1,
            velocity: 12.5,
            has_data: true,
        };
        assert_eq!(
            compose_notes(Some(&interest), Some("Good.")).as_deref(),
            Some("Velocity: 12.5%\n\nAI Insight: Good.")
        );
        assert_eq!(compose_notes(None, None), None);
    }

    #[test]
    fn velocity_always_renders_a_decimal_point() {
        let with_velocity = |velocity| InterestSummary {
            keyword: "k".to_string(),
            current_volume: 1,
            average_volume: 1,
            max_volume: 1,
            velocity,
            has_data: true,
        };
        let note = |v: f64| compose_notes(Some(&with_velocity(v)), None);

        assert_eq!(note(60.0).as_deref(), Some("Velocity: 60.0%"));
        assert_eq!(note(-7.0).as_deref(), Some("Velocity: -7.0%"));
        assert_eq!(note(12.35).as_deref(), Some("Velocity: 12.35%"));
        assert_eq!(note(0.0).as_deref(), Some("Velocity: 0.0%"));
    }
}
