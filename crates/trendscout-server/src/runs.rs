//! At most one trend run at a time.
//!
//! [`RunLock`] is the in-process fast path shared by the HTTP trigger and the
//! cron job; the database scan lock behind it also excludes runs started by
//! other processes, such as the CLI.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::{Mutex, OwnedMutexGuard};
use trendscout_core::Region;
use trendscout_db::ScanRunRow;
use trendscout_trends::TrendService;

#[derive(Debug, Clone, Default)]
pub struct RunLock(Arc<Mutex<()>>);

impl RunLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while another run holds the lock.
    pub fn try_acquire(&self) -> Option<OwnedMutexGuard<()>> {
        Arc::clone(&self.0).try_lock_owned().ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartRunError {
    #[error("a scan is already running")]
    Busy,
    #[error(transparent)]
    Db(#[from] trendscout_db::DbError),
}

/// Records a queued scan run and executes it on a background task.
///
/// Both locks are taken before the row is created and released when the run
/// finishes.
///
/// # Errors
///
/// [`StartRunError::Busy`] if a run is active here or in another process;
/// [`StartRunError::Db`] if the scan lock or the scan run row cannot be
/// obtained.
pub async fn start_background_run(
    pool: &PgPool,
    service: &Arc<TrendService>,
    lock: &RunLock,
    trigger_source: &str,
    region: Option<Region>,
) -> Result<ScanRunRow, StartRunError> {
    let guard = lock.try_acquire().ok_or(StartRunError::Busy)?;
    let scan_lock = trendscout_db::try_lock_scans(pool)
        .await?
        .ok_or(StartRunError::Busy)?;
    let region = region.unwrap_or(service.run_config().region);
    let run = trendscout_db::create_scan_run(pool, region.code(), trigger_source).await?;

    let pool = pool.clone();
    let service = Arc::clone(service);
    let run_id = run.id;
    tokio::spawn(async move {
        let _guard = guard;
        let outcome = trendscout_trends::execute_tracked_run(
            &pool,
            &service,
            scan_lock,
            run_id,
            Some(region),
        )
        .await;
        match outcome {
            Ok(result) => tracing::info!(
                run_id,
                top_n = result.top_n.len(),
                hot = result.hot_count,
                "background scan finished"
            ),
            Err(e) => tracing::warn!(run_id, error = %e, "background scan failed"),
        }
    });

    Ok(run)
}

/// Starts one scan in the background as the server comes up. A refusal or a
/// database error is logged; startup continues either way.
pub async fn queue_startup_scan(pool: &PgPool, service: &Arc<TrendService>, lock: &RunLock) {
    match start_background_run(pool, service, lock, "startup", None).await {
        Ok(run) => tracing::info!(run_id = run.id, region = %run.region, "startup scan queued"),
        Err(StartRunError::Busy) => {
            tracing::warn!("startup scan skipped; another scan is already running");
        }
        Err(e) => tracing::error!(error = %e, "failed to queue startup scan"),
    }
}
