//! Cross-process exclusion for scan runs.
//!
//! A Postgres session advisory lock held on a dedicated connection for the
//! lifetime of a run. Every trigger takes it, so two processes sharing one
//! database never reconcile products at the same time.

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};

use crate::DbError;

/// Advisory lock key reserved for scan runs.
pub const SCAN_LOCK_KEY: i64 = 0x7472_656e_6473;

/// Proof that this process owns the scan lock.
///
/// The connection is closed rather than returned to the pool when dropped,
/// which releases the lock server-side even if [`ScanLock::release`] is
/// never reached.
pub struct ScanLock {
    conn: PoolConnection<Postgres>,
}

impl std::fmt::Debug for ScanLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanLock").field("key", &SCAN_LOCK_KEY).finish()
    }
}

/// Takes the scan lock without waiting.
///
/// Returns `None` when another session already holds it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if no connection can be acquired or the lock
/// query fails.
pub async fn try_lock_scans(pool: &PgPool) -> Result<Option<ScanLock>, DbError> {
    let mut conn = pool.acquire().await?;
    let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
        .bind(SCAN_LOCK_KEY)
        .fetch_one(&mut *conn)
        .await?;

    if !acquired {
        return Ok(None);
    }

    // Session locks outlive the checkout; never hand this connection back.
    conn.close_on_drop();
    Ok(Some(ScanLock { conn }))
}

impl ScanLock {
    /// Releases the lock and closes its connection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the unlock query fails. The lock is
    /// still freed when the connection closes.
    pub async fn release(mut self) -> Result<(), DbError> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(SCAN_LOCK_KEY)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }
}
