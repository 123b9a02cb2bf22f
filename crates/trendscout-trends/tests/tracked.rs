//! Tracked runs against a live, migrated Postgres database.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use trendscout_core::{RawListing, Region, RunConfig};
use trendscout_scraper::{ListingSource, ScraperError};
use trendscout_trends::{
    acquire_scan_lock, run_tracked, PgProductStore, TrackedRunError, TrendService,
};

fn listing(name: &str, rank: u32, price: f64) -> RawListing {
    RawListing {
        name: name.to_string(),
        category: "Home".to_string(),
        url: format!("https://example.com/dp/{}", name.replace(' ', "-")),
        price: Some(price),
        rank: Some(rank),
    }
}

fn listings() -> Vec<RawListing> {
    vec![listing("Widget A", 1, 30.0), listing("Widget B", 60, 5.0)]
}

/// Serves fixed listings, optionally parking inside the fetch until released.
struct GatedSource {
    listings: Vec<RawListing>,
    gated: bool,
    entered: Notify,
    release: Notify,
}

impl GatedSource {
    fn open() -> Self {
        Self::new(false)
    }

    fn gated() -> Self {
        Self::new(true)
    }

    fn new(gated: bool) -> Self {
        Self {
            listings: listings(),
            gated,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl ListingSource for GatedSource {
    async fn categories(&self, _region: Region) -> Result<Vec<String>, ScraperError> {
        Ok(vec!["Home".to_string()])
    }

    async fn fetch_category(
        &self,
        _region: Region,
        _category: &str,
        limit: usize,
    ) -> Result<Vec<RawListing>, ScraperError> {
        if self.gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(self.listings.iter().take(limit).cloned().collect())
    }
}

fn service(pool: &sqlx::PgPool, source: Arc<GatedSource>) -> TrendService {
    let config = RunConfig {
        lookup_spacing_ms: (0, 0),
        ..RunConfig::default()
    };
    TrendService::new(source, Arc::new(PgProductStore::new(pool.clone())), config)
}

#[sqlx::test(migrations = "../../migrations")]
async fn tracked_run_is_refused_while_the_scan_lock_is_held(pool: sqlx::PgPool) {
    let svc = service(&pool, Arc::new(GatedSource::open()));
    let held = acquire_scan_lock(&pool).await.expect("lock should be free");

    let refused = run_tracked(&pool, &svc, "cli", None).await;
    assert!(matches!(refused, Err(TrackedRunError::Busy)));
    let runs = trendscout_db::list_scan_runs(&pool, 10).await.unwrap();
    assert!(runs.is_empty(), "a refused run leaves no scan_runs row");

    held.release().await.expect("release failed");

    let result = run_tracked(&pool, &svc, "cli", None)
        .await
        .expect("run should proceed once the lock is free");
    assert_eq!(result.stored_count, 2);
    let runs = trendscout_db::list_scan_runs(&pool, 10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "succeeded");
}

#[sqlx::test(migrations = "../../migrations")]
async fn overlapping_triggers_keep_one_product_per_name(pool: sqlx::PgPool) {
    let gated = Arc::new(GatedSource::gated());
    let first_service = Arc::new(service(&pool, Arc::clone(&gated)));
    // A second service over the same database, as a separate process would build.
    let second_service = service(&pool, Arc::new(GatedSource::open()));

    let first = {
        let pool = pool.clone();
        let svc = Arc::clone(&first_service);
        tokio::spawn(async move { run_tracked(&pool, &svc, "scheduler", None).await })
    };
    gated.entered.notified().await;

    let second = run_tracked(&pool, &second_service, "cli", None).await;
    assert!(matches!(second, Err(TrackedRunError::Busy)));

    gated.release.notify_one();
    let result = first
        .await
        .expect("task panicked")
        .expect("first run should succeed");
    assert_eq!(result.stored_count, 2);

    let products = trendscout_db::list_top_products(&pool, 10).await.unwrap();
    let mut names: Vec<String> = products.into_iter().map(|p| p.product_name).collect();
    names.sort();
    assert_eq!(names, vec!["Widget A".to_string(), "Widget B".to_string()]);

    let runs = trendscout_db::list_scan_runs(&pool, 10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].trigger_source, "scheduler");
}
