//! Database operations for `scan_runs`.
//!
//! A run moves `queued → running → succeeded | failed`. Each transition is
//! guarded on the expected prior status so a run can never be completed
//! twice or resurrected after failing.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const SCAN_RUN_COLUMNS: &str = "id, public_id, region, trigger_source, status, started_at, \
     completed_at, listings_scraped, products_stored, hot_count, error_message, created_at";

/// A row from the `scan_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub region: String,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub listings_scraped: i32,
    pub products_stored: i32,
    pub hot_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counters written when a run succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanRunTotals {
    pub listings_scraped: i32,
    pub products_stored: i32,
    pub hot_count: i32,
}

/// Creates a new scan run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scan_run(
    pool: &PgPool,
    region: &str,
    trigger_source: &str,
) -> Result<ScanRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ScanRunRow>(&format!(
        "INSERT INTO scan_runs (public_id, region, trigger_source, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING {SCAN_RUN_COLUMNS}"
    ))
    .bind(public_id)
    .bind(region)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a queued run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanRunTransition`] if the run is not queued,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn start_scan_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scan_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a running run as `succeeded` and records its totals.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanRunTransition`] if the run is not running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn complete_scan_run(
    pool: &PgPool,
    id: i64,
    totals: ScanRunTotals,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scan_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             listings_scraped = $1, products_stored = $2, hot_count = $3 \
         WHERE id = $4 AND status = 'running'",
    )
    .bind(totals.listings_scraped)
    .bind(totals.products_stored)
    .bind(totals.hot_count)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a running run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanRunTransition`] if the run is not running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn fail_scan_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scan_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_scan_run(pool: &PgPool, id: i64) -> Result<ScanRunRow, DbError> {
    sqlx::query_as::<_, ScanRunRow>(&format!(
        "SELECT {SCAN_RUN_COLUMNS} FROM scan_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scan_runs(pool: &PgPool, limit: i64) -> Result<Vec<ScanRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanRunRow>(&format!(
        "SELECT {SCAN_RUN_COLUMNS} FROM scan_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
