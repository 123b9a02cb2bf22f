//! The persistent product store seam.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use trendscout_core::{HistoryEntry, NewProduct, PersistedProduct, ProductStatus, ProductUpdate};
use trendscout_db::DbError;

use crate::error::StoreError;

/// Name-keyed product storage with append-only history.
///
/// Implementations do not deduplicate by name; callers look up before
/// writing.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<PersistedProduct>, StoreError>;

    async fn insert(&self, product: &NewProduct) -> Result<PersistedProduct, StoreError>;

    /// Overwrites the mutable fields of `id` and bumps `last_updated`.
    /// Leaves `first_seen_date` and `status` alone.
    async fn update(&self, id: i64, update: &ProductUpdate)
        -> Result<PersistedProduct, StoreError>;

    async fn append_history(
        &self,
        product_id: i64,
        trend_score: f64,
        search_volume: i32,
    ) -> Result<HistoryEntry, StoreError>;

    /// Archives active products not updated for `older_than_days` whose
    /// score is below `score_below`. Returns how many were archived.
    async fn archive_stale(&self, older_than_days: u32, score_below: f64)
        -> Result<u64, StoreError>;

    /// Active products, best score first, ties by `id`.
    async fn top_by_score(&self, limit: usize) -> Result<Vec<PersistedProduct>, StoreError>;

    /// History for one product, newest first.
    async fn history(&self, product_id: i64, limit: usize)
        -> Result<Vec<HistoryEntry>, StoreError>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<PersistedProduct>, StoreError> {
        let row = trendscout_db::find_product_by_name(&self.pool, name).await?;
        Ok(row.map(PersistedProduct::from))
    }

    async fn insert(&self, product: &NewProduct) -> Result<PersistedProduct, StoreError> {
        let row = trendscout_db::insert_product(&self.pool, product).await?;
        Ok(row.into())
    }

    async fn update(
        &self,
        id: i64,
        update: &ProductUpdate,
    ) -> Result<PersistedProduct, StoreError> {
        match trendscout_db::update_product(&self.pool, id, update).await {
            Ok(row) => Ok(row.into()),
            Err(DbError::NotFound) => Err(StoreError::NotFound { id }),
            Err(e) => Err(e.into()),
        }
    }

    async fn append_history(
        &self,
        product_id: i64,
        trend_score: f64,
        search_volume: i32,
    ) -> Result<HistoryEntry, StoreError> {
        let row =
            trendscout_db::insert_history(&self.pool, product_id, trend_score, search_volume)
                .await?;
        Ok(row.into())
    }

    async fn archive_stale(
        &self,
        older_than_days: u32,
        score_below: f64,
    ) -> Result<u64, StoreError> {
        Ok(trendscout_db::archive_stale_products(&self.pool, older_than_days, score_below).await?)
    }

    async fn top_by_score(&self, limit: usize) -> Result<Vec<PersistedProduct>, StoreError> {
        let rows = trendscout_db::list_top_products(&self.pool, to_limit(limit)).await?;
        Ok(rows.into_iter().map(PersistedProduct::from).collect())
    }

    async fn history(
        &self,
        product_id: i64,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let rows = trendscout_db::list_history(&self.pool, product_id, to_limit(limit)).await?;
        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    products: Vec<PersistedProduct>,
    history: Vec<HistoryEntry>,
    next_id: i64,
}

/// In-process store for dry runs and tests. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    /// Every stored product, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn products(&self) -> Result<Vec<PersistedProduct>, StoreError> {
        Ok(self.lock()?.products.clone())
    }

    /// Every history entry, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn history_entries(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self.lock()?.history.clone())
    }

    /// Overrides `last_updated`, e.g. to stage archival candidates.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` is unknown.
    pub fn set_last_updated(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound { id })?;
        product.last_updated = at;
        Ok(())
    }
}

fn check_score(score: f64) -> Result<(), StoreError> {
    if (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(StoreError::Rejected(format!(
            "trend_score {score} outside [0, 100]"
        )))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<PersistedProduct>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .products
            .iter()
            .find(|p| p.product_name == name)
            .cloned())
    }

    async fn insert(&self, product: &NewProduct) -> Result<PersistedProduct, StoreError> {
        check_score(product.trend_score)?;
        let mut state = self.lock()?;
        state.next_id += 1;
        let now = Utc::now();
        let stored = PersistedProduct {
            id: state.next_id,
            product_name: product.product_name.clone(),
            category: product.category.clone(),
            source_url: product.source_url.clone(),
            trend_score: product.trend_score,
            search_volume: product.search_volume,
            price_estimate: product.price_estimate,
            first_seen_date: now,
            last_updated: now,
            status: ProductStatus::Active,
            notes: product.notes.clone(),
        };
        state.products.push(stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: i64,
        update: &ProductUpdate,
    ) -> Result<PersistedProduct, StoreError> {
        check_score(update.trend_score)?;
        let mut state = self.lock()?;
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound { id })?;
        product.category.clone_from(&update.category);
        product.source_url.clone_from(&update.source_url);
        product.trend_score = update.trend_score;
        product.search_volume = update.search_volume;
        product.price_estimate = update.price_estimate;
        product.notes.clone_from(&update.notes);
        product.last_updated = Utc::now();
        Ok(product.clone())
    }

    async fn append_history(
        &self,
        product_id: i64,
        trend_score: f64,
        search_volume: i32,
    ) -> Result<HistoryEntry, StoreError> {
        let mut state = self.lock()?;
        if !state.products.iter().any(|p| p.id == product_id) {
            return Err(StoreError::NotFound { id: product_id });
        }
        let entry = HistoryEntry {
            product_id,
            trend_score,
            search_volume,
            recorded_at: Utc::now(),
        };
        state.history.push(entry.clone());
        Ok(entry)
    }

    async fn archive_stale(
        &self,
        older_than_days: u32,
        score_below: f64,
    ) -> Result<u64, StoreError> {
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        let mut state = self.lock()?;
        let mut archived = 0u64;
        for product in &mut state.products {
            if product.status == ProductStatus::Active
                && product.last_updated < cutoff
                && product.trend_score < score_below
            {
                product.status = ProductStatus::Archived;
                archived += 1;
            }
        }
        Ok(archived)
    }

    async fn top_by_score(&self, limit: usize) -> Result<Vec<PersistedProduct>, StoreError> {
        let state = self.lock()?;
        let mut active: Vec<PersistedProduct> = state
            .products
            .iter()
            .filter(|p| p.status == ProductStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.trend_score
                .total_cmp(&a.trend_score)
                .then_with(|| a.id.cmp(&b.id))
        });
        active.truncate(limit);
        Ok(active)
    }

    async fn history(
        &self,
        product_id: i64,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .history
            .iter()
            .rev()
            .filter(|h| h.product_id == product_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str, score: f64) -> NewProduct {
        NewProduct {
            product_name: name.to_string(),
            category: "Home".to_string(),
            source_url: format!("https://example.com/dp/{name}"),
            trend_score: score,
            search_volume: 0,
            price_estimate: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn memory_store_assigns_ids_and_finds_by_exact_name() {
        let store = MemoryStore::new();
        let a = store.insert(&new_product("Widget A", 65.0)).await.unwrap();
        let b = store.insert(&new_product("Widget B", 35.0)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(a.first_seen_date, a.last_updated);

        assert_eq!(
            store.find_by_name("Widget B").await.unwrap().map(|p| p.id),
            Some(2)
        );
        assert!(store.find_by_name("widget b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_update_preserves_first_seen_and_status() {
        let store = MemoryStore::new();
        let a = store.insert(&new_product("Widget A", 40.0)).await.unwrap();
        store
            .set_last_updated(a.id, Utc::now() - Duration::days(40))
            .unwrap();
        assert_eq!(store.archive_stale(30, 50.0).await.unwrap(), 1);

        let update = ProductUpdate {
            category: "Beauty".to_string(),
            source_url: "u".to_string(),
            trend_score: 45.0,
            search_volume: 3,
            price_estimate: Some(9.0),
            notes: None,
        };
        let updated = store.update(a.id, &update).await.unwrap();
        assert_eq!(updated.first_seen_date, a.first_seen_date);
        assert_eq!(updated.status, ProductStatus::Archived);
        assert_eq!(updated.category, "Beauty");
    }

    #[tokio::test]
    async fn memory_store_rejects_out_of_range_scores() {
        let store = MemoryStore::new();
        let err = store.insert(&new_product("Bad", 101.0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn memory_top_by_score_skips_archived_and_breaks_ties_by_id() {
        let store = MemoryStore::new();
        store.insert(&new_product("A", 60.0)).await.unwrap();
        store.insert(&new_product("B", 80.0)).await.unwrap();
        store.insert(&new_product("C", 60.0)).await.unwrap();
        let d = store.insert(&new_product("D", 10.0)).await.unwrap();
        store
            .set_last_updated(d.id, Utc::now() - Duration::days(31))
            .unwrap();
        store.archive_stale(30, 50.0).await.unwrap();

        let top = store.top_by_score(10).await.unwrap();
        let names: Vec<&str> = top.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
        assert_eq!(store.top_by_score(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn memory_history_is_newest_first_and_requires_product() {
        let store = MemoryStore::new();
        let a = store.insert(&new_product("A", 60.0)).await.unwrap();
        store.append_history(a.id, 60.0, 0).await.unwrap();
        store.append_history(a.id, 70.0, 5).await.unwrap();

        let history = store.history(a.id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!((history[0].trend_score - 70.0).abs() < f64::EPSILON);

        let err = store.append_history(99, 1.0, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 99 }));
    }
}
