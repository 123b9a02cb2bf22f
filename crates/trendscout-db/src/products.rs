//! Database operations for `trending_products`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use trendscout_core::{NewProduct, PersistedProduct, ProductStatus, ProductUpdate};

use crate::DbError;

const PRODUCT_COLUMNS: &str = "id, product_name, category, source_url, trend_score, \
     search_volume, price_estimate, first_seen_date, last_updated, status, notes";

/// A row from the `trending_products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub product_name: String,
    pub category: String,
    pub source_url: String,
    pub trend_score: f64,
    pub search_volume: i32,
    pub price_estimate: Option<f64>,
    pub first_seen_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// `active` or `archived` (enforced by a CHECK constraint).
    pub status: String,
    pub notes: Option<String>,
}

impl From<ProductRow> for PersistedProduct {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            product_name: row.product_name,
            category: row.category,
            source_url: row.source_url,
            trend_score: row.trend_score,
            search_volume: row.search_volume,
            price_estimate: row.price_estimate,
            first_seen_date: row.first_seen_date,
            last_updated: row.last_updated,
            status: ProductStatus::from_db(&row.status),
            notes: row.notes,
        }
    }
}

/// Returns the product whose `product_name` equals `name` exactly.
///
/// Should more than one row ever share a name, the oldest (lowest `id`) wins
/// so repeated runs keep converging on the same record.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_product_by_name(
    pool: &PgPool,
    name: &str,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM trending_products \
         WHERE product_name = $1 \
         ORDER BY id ASC \
         LIMIT 1"
    ))
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetches a single product by its `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<ProductRow, DbError> {
    sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM trending_products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Inserts a first sighting. `first_seen_date` and `last_updated` are set to
/// `NOW()` and `status` to `active`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including CHECK violations
/// for out-of-range scores).
pub async fn insert_product(pool: &PgPool, product: &NewProduct) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO trending_products \
             (product_name, category, source_url, trend_score, search_volume, \
              price_estimate, notes, status, first_seen_date, last_updated) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'active', NOW(), NOW()) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&product.product_name)
    .bind(&product.category)
    .bind(&product.source_url)
    .bind(product.trend_score)
    .bind(product.search_volume)
    .bind(product.price_estimate)
    .bind(&product.notes)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Overwrites the mutable fields of an existing product and bumps
/// `last_updated`. `first_seen_date`, `product_name` and `status` are left
/// untouched.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if `id` does not exist, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    update: &ProductUpdate,
) -> Result<ProductRow, DbError> {
    sqlx::query_as::<_, ProductRow>(&format!(
        "UPDATE trending_products SET \
             category       = $2, \
             source_url     = $3, \
             trend_score    = $4, \
             search_volume  = $5, \
             price_estimate = $6, \
             notes          = $7, \
             last_updated   = NOW() \
         WHERE id = $1 \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(&update.category)
    .bind(&update.source_url)
    .bind(update.trend_score)
    .bind(update.search_volume)
    .bind(update.price_estimate)
    .bind(&update.notes)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Marks active products as `archived` when they have not been updated for
/// `older_than_days` days and score below `score_below`.
///
/// Returns the number of rows archived.
///
/// # Errors
///
/// Returns [`DbError::OutOfRange`] if `older_than_days` does not fit the
/// interval type, or [`DbError::Sqlx`] if the update fails.
pub async fn archive_stale_products(
    pool: &PgPool,
    older_than_days: u32,
    score_below: f64,
) -> Result<u64, DbError> {
    let days = i32::try_from(older_than_days).map_err(|_| DbError::OutOfRange {
        field: "older_than_days",
        value: older_than_days.to_string(),
    })?;

    let result = sqlx::query(
        "UPDATE trending_products \
         SET status = 'archived' \
         WHERE status = 'active' \
           AND last_updated < NOW() - make_interval(days => $1) \
           AND trend_score < $2",
    )
    .bind(days)
    .bind(score_below)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Returns the highest-scoring active products, ties broken by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_top_products(pool: &PgPool, limit: i64) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM trending_products \
         WHERE status = 'active' \
         ORDER BY trend_score DESC, id ASC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
