//! Runs recorded in `scan_runs`.
//!
//! Every tracked run holds the database scan lock for its whole duration, so
//! runs started by different processes against one database never overlap.
//! Bookkeeping is best-effort: a failure to write the run row is logged and
//! never changes the outcome of the run itself.

use sqlx::PgPool;
use trendscout_core::Region;
use trendscout_db::{ScanLock, ScanRunTotals};

use crate::error::{PipelineError, TrackedRunError};
use crate::service::{RunResult, TrendService};

fn clamp_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

async fn fail_run_best_effort(pool: &PgPool, run_id: i64, message: &str) {
    if let Err(mark_err) = trendscout_db::fail_scan_run(pool, run_id, message).await {
        tracing::error!(run_id, error = %mark_err, "failed to mark scan run as failed");
    }
}

async fn release_best_effort(lock: ScanLock) {
    if let Err(e) = lock.release().await {
        tracing::warn!(error = %e, "failed to release scan lock; closing its connection");
    }
}

/// Takes the scan lock without waiting.
///
/// # Errors
///
/// [`TrackedRunError::Busy`] if another session holds the lock,
/// [`TrackedRunError::Lock`] if the lock query fails.
pub async fn acquire_scan_lock(pool: &PgPool) -> Result<ScanLock, TrackedRunError> {
    trendscout_db::try_lock_scans(pool)
        .await
        .map_err(TrackedRunError::Lock)?
        .ok_or(TrackedRunError::Busy)
}

/// Drives an already-created scan run through `running` to `succeeded` or
/// `failed` around one `run_once`, then releases `lock`.
///
/// # Errors
///
/// Returns the [`PipelineError`] of the run, if any.
pub async fn execute_tracked_run(
    pool: &PgPool,
    service: &TrendService,
    lock: ScanLock,
    run_id: i64,
    region: Option<Region>,
) -> Result<RunResult, PipelineError> {
    let outcome = drive_run(pool, service, run_id, region).await;
    release_best_effort(lock).await;
    outcome
}

async fn drive_run(
    pool: &PgPool,
    service: &TrendService,
    run_id: i64,
    region: Option<Region>,
) -> Result<RunResult, PipelineError> {
    if let Err(e) = trendscout_db::start_scan_run(pool, run_id).await {
        tracing::warn!(run_id, error = %e, "failed to mark scan run as running");
    }

    match service.run_once(region).await {
        Ok(result) => {
            let totals = ScanRunTotals {
                listings_scraped: clamp_i32(result.listings_scraped),
                products_stored: clamp_i32(result.stored_count),
                hot_count: clamp_i32(result.hot_count),
            };
            if let Err(e) = trendscout_db::complete_scan_run(pool, run_id, totals).await {
                tracing::error!(run_id, error = %e, "failed to mark scan run as succeeded");
            }
            Ok(result)
        }
        Err(e) => {
            fail_run_best_effort(pool, run_id, &e.to_string()).await;
            Err(e)
        }
    }
}

/// Takes the scan lock, creates a scan run row and executes it. If the row
/// cannot be created the run still happens, untracked but locked.
///
/// # Errors
///
/// [`TrackedRunError::Busy`] without creating a row when another run holds
/// the lock; otherwise the run's own error, if any.
pub async fn run_tracked(
    pool: &PgPool,
    service: &TrendService,
    trigger_source: &str,
    region: Option<Region>,
) -> Result<RunResult, TrackedRunError> {
    let lock = acquire_scan_lock(pool).await?;
    let effective = region.unwrap_or(service.run_config().region);
    match trendscout_db::create_scan_run(pool, effective.code(), trigger_source).await {
        Ok(run) => {
            tracing::info!(
                run_id = run.id,
                public_id = %run.public_id,
                region = %effective,
                trigger_source,
                "scan run created"
            );
            Ok(execute_tracked_run(pool, service, lock, run.id, Some(effective)).await?)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to create scan run; running untracked");
            let outcome = service.run_once(Some(effective)).await;
            release_best_effort(lock).await;
            Ok(outcome?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_saturate_at_i32_max() {
        assert_eq!(clamp_i32(42), 42);
        assert_eq!(clamp_i32(usize::MAX), i32::MAX);
    }
}
