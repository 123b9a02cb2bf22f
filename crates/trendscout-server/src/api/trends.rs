use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trendscout_core::{HistoryEntry, PersistedProduct};

use crate::middleware::RequestId;

use super::{
    map_db_error, map_store_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct TrendItem {
    id: i64,
    product_name: String,
    category: String,
    source_url: String,
    trend_score: f64,
    search_volume: i32,
    price_estimate: Option<f64>,
    first_seen_date: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    status: &'static str,
    notes: Option<String>,
}

impl From<PersistedProduct> for TrendItem {
    fn from(p: PersistedProduct) -> Self {
        Self {
            id: p.id,
            product_name: p.product_name,
            category: p.category,
            source_url: p.source_url,
            trend_score: p.trend_score,
            search_volume: p.search_volume,
            price_estimate: p.price_estimate,
            first_seen_date: p.first_seen_date,
            last_updated: p.last_updated,
            status: p.status.as_str(),
            notes: p.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct HistoryItem {
    trend_score: f64,
    search_volume: i32,
    recorded_at: DateTime<Utc>,
}

impl From<HistoryEntry> for HistoryItem {
    fn from(h: HistoryEntry) -> Self {
        Self {
            trend_score: h.trend_score,
            search_volume: h.search_volume,
            recorded_at: h.recorded_at,
        }
    }
}

fn as_usize(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(1)
}

pub(super) async fn list_trends(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<TrendItem>>>, ApiError> {
    let products = state
        .service
        .get_top(as_usize(normalize_limit(query.limit)))
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: products.into_iter().map(TrendItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_product_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<HistoryItem>>>, ApiError> {
    match trendscout_db::get_product(&state.pool, id).await {
        Ok(_) => {}
        Err(trendscout_db::DbError::NotFound) => {
            return Err(ApiError::new(
                req_id.0,
                "not_found",
                format!("product {id} not found"),
            ));
        }
        Err(e) => return Err(map_db_error(req_id.0, &e)),
    }

    let history = state
        .service
        .history(id, as_usize(normalize_limit(query.limit)))
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: history.into_iter().map(HistoryItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
