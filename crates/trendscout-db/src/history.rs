//! Database operations for `trend_history`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use trendscout_core::HistoryEntry;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryRow {
    pub id: i64,
    pub product_id: i64,
    pub trend_score: f64,
    pub search_volume: i32,
    pub recorded_at: DateTime<Utc>,
}

impl From<HistoryRow> for HistoryEntry {
    fn from(row: HistoryRow) -> Self {
        Self {
            product_id: row.product_id,
            trend_score: row.trend_score,
            search_volume: row.search_volume,
            recorded_at: row.recorded_at,
        }
    }
}

/// Appends one observation for `product_id`, stamped `NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a foreign-key
/// violation for an unknown product).
pub async fn insert_history(
    pool: &PgPool,
    product_id: i64,
    trend_score: f64,
    search_volume: i32,
) -> Result<HistoryRow, DbError> {
    let row = sqlx::query_as::<_, HistoryRow>(
        "INSERT INTO trend_history (product_id, trend_score, search_volume, recorded_at) \
         VALUES ($1, $2, $3, NOW()) \
         RETURNING id, product_id, trend_score, search_volume, recorded_at",
    )
    .bind(product_id)
    .bind(trend_score)
    .bind(search_volume)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the most recent `limit` observations for a product, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_history(
    pool: &PgPool,
    product_id: i64,
    limit: i64,
) -> Result<Vec<HistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT id, product_id, trend_score, search_volume, recorded_at \
         FROM trend_history \
         WHERE product_id = $1 \
         ORDER BY recorded_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(product_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
