//! Background job scheduler.
//!
//! Registers the recurring trend scan on `TRENDSCOUT_CRON`.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use trendscout_trends::{TrackedRunError, TrendService};

use crate::runs::RunLock;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    service: Arc<TrendService>,
    run_lock: RunLock,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_scan_job(&scheduler, pool, service, run_lock, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_scan_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    service: Arc<TrendService>,
    run_lock: RunLock,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = pool.clone();
        let service = Arc::clone(&service);
        let run_lock = run_lock.clone();

        Box::pin(async move {
            run_scheduled_scan(&pool, &service, &run_lock).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: trend scan registered");
    Ok(())
}

async fn run_scheduled_scan(pool: &PgPool, service: &TrendService, run_lock: &RunLock) {
    let Some(_guard) = run_lock.try_acquire() else {
        tracing::warn!("scheduler: previous scan still running; skipping this tick");
        return;
    };

    tracing::info!("scheduler: starting trend scan");
    match trendscout_trends::run_tracked(pool, service, "scheduler", None).await {
        Ok(result) => tracing::info!(
            top_n = result.top_n.len(),
            hot = result.hot_count,
            stored = result.stored_count,
            "scheduler: trend scan complete"
        ),
        Err(TrackedRunError::Busy) => {
            tracing::warn!("scheduler: another process is running a scan; skipping this tick");
        }
        Err(e) => tracing::error!(error = %e, "scheduler: trend scan failed"),
    }
}
