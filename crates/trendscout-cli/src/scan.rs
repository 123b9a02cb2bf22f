//! `scan` command handlers.

use std::path::Path;
use std::sync::Arc;

use trendscout_core::{AppConfig, Region};
use trendscout_scraper::{BestsellerSource, FileListingSource, ListingSource};
use trendscout_trends::{LogNotifier, MemoryStore, PgProductStore, RunResult, TrendService};

fn build_source(
    config: &AppConfig,
    listings: Option<&Path>,
) -> anyhow::Result<Arc<dyn ListingSource>> {
    if let Some(path) = listings {
        tracing::info!(path = %path.display(), "reading listings from file");
        return Ok(Arc::new(FileListingSource::new(path)));
    }
    let sources = trendscout_core::load_sources(&config.sources_path)?;
    Ok(Arc::new(BestsellerSource::from_config(config, sources)?))
}

/// Runs a tracked scan against the database.
///
/// # Errors
///
/// Returns an error if the listing source cannot be built, another process
/// is already scanning the same database, or the run fails.
pub(crate) async fn run_scan(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    region: Option<Region>,
    listings: Option<&Path>,
) -> anyhow::Result<()> {
    let source = build_source(config, listings)?;
    let store = Arc::new(PgProductStore::new(pool.clone()));
    let service = TrendService::from_app_config(config, store, source)?;

    let result = trendscout_trends::run_tracked(pool, &service, "cli", region).await?;
    print_result(&result, false);
    Ok(())
}

/// Scores and ranks into a throwaway in-memory store. Notifications are
/// logged, not sent.
///
/// # Errors
///
/// Returns an error if the listing source cannot be built or the run fails.
pub(crate) async fn run_scan_dry(
    config: &AppConfig,
    region: Option<Region>,
    listings: Option<&Path>,
) -> anyhow::Result<()> {
    let source = build_source(config, listings)?;
    let service = TrendService::from_app_config(config, Arc::new(MemoryStore::new()), source)?
        .with_notifier(Arc::new(LogNotifier));

    let result = service.run_once(region).await?;
    print_result(&result, true);
    Ok(())
}

fn print_result(result: &RunResult, dry_run: bool) {
    println!(
        "{}region {}: {} listings, {} ranked, {} hot, {} stored, {} archived in {:.1}s",
        if dry_run { "[dry run] " } else { "" },
        result.region,
        result.listings_scraped,
        result.top_n.len(),
        result.hot_count,
        result.stored_count,
        result.archived_count,
        result.duration.as_secs_f64(),
    );
    if result.reconciliation.failed > 0 {
        println!(
            "warning: {} of {} products failed to store",
            result.reconciliation.failed, result.reconciliation.attempted
        );
    }
    println!();
    println!(
        "{:<5}{:<8}{:<10}{:<18}PRODUCT",
        "#", "SCORE", "PRICE", "CATEGORY"
    );
    for (idx, item) in result.top_n.iter().enumerate() {
        println!(
            "{:<5}{:<8.2}{:<10}{:<18}{}",
            idx + 1,
            item.trend_score,
            crate::query::fmt_price(item.price),
            crate::query::clip(&item.category, 16),
            crate::query::clip(&item.name, 60),
        );
    }
}
