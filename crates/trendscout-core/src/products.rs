use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::listings::ScoredItem;

/// Lifecycle state of a persisted product. Archival is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Archived,
}

impl ProductStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Archived => "archived",
        }
    }

    /// Parses the stored column value; anything unrecognised is treated as
    /// archived so it never resurfaces in active listings.
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        match value {
            "active" => ProductStatus::Active,
            _ => ProductStatus::Archived,
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable record of a trending product, keyed by `product_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedProduct {
    pub id: i64,
    pub product_name: String,
    pub category: String,
    pub source_url: String,
    pub trend_score: f64,
    pub search_volume: i32,
    pub price_estimate: Option<f64>,
    /// Set on insert and never overwritten.
    pub first_seen_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub status: ProductStatus,
    pub notes: Option<String>,
}

/// Fields written when a product name is seen for the first time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub product_name: String,
    pub category: String,
    pub source_url: String,
    pub trend_score: f64,
    pub search_volume: i32,
    pub price_estimate: Option<f64>,
    pub notes: Option<String>,
}

/// The mutable fields overwritten on every later sighting.
///
/// `id`, `product_name`, `first_seen_date` and `status` are deliberately absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub category: String,
    pub source_url: String,
    pub trend_score: f64,
    pub search_volume: i32,
    pub price_estimate: Option<f64>,
    pub notes: Option<String>,
}

impl From<&ScoredItem> for NewProduct {
    fn from(item: &ScoredItem) -> Self {
        Self {
            product_name: item.name.clone(),
            category: item.category.clone(),
            source_url: item.url.clone(),
            trend_score: item.trend_score,
            search_volume: item.search_volume,
            price_estimate: item.price,
            notes: item.notes.clone(),
        }
    }
}

impl From<&ScoredItem> for ProductUpdate {
    fn from(item: &ScoredItem) -> Self {
        Self {
            category: item.category.clone(),
            source_url: item.url.clone(),
            trend_score: item.trend_score,
            search_volume: item.search_volume,
            price_estimate: item.price,
            notes: item.notes.clone(),
        }
    }
}

/// Append-only point-in-time score snapshot for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub product_id: i64,
    pub trend_score: f64,
    pub search_volume: i32,
    pub recorded_at: DateTime<Utc>,
}
