use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trendscout_core::Region;
use trendscout_db::ScanRunRow;
use uuid::Uuid;

use crate::middleware::RequestId;
use crate::runs::{start_background_run, StartRunError};

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ScansQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct TriggerScanBody {
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScanRunItem {
    scan_run_id: Uuid,
    region: String,
    trigger_source: String,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    listings_scraped: i32,
    products_stored: i32,
    hot_count: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ScanRunRow> for ScanRunItem {
    fn from(row: ScanRunRow) -> Self {
        Self {
            scan_run_id: row.public_id,
            region: row.region,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            listings_scraped: row.listings_scraped,
            products_stored: row.products_stored,
            hot_count: row.hot_count,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn list_scans(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScansQuery>,
) -> Result<Json<ApiResponse<Vec<ScanRunItem>>>, ApiError> {
    let rows = trendscout_db::list_scan_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ScanRunItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Starts a tracked scan in the background. The body is optional.
pub(super) async fn trigger_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<ScanRunItem>>), ApiError> {
    let body: TriggerScanBody = if body.iter().all(u8::is_ascii_whitespace) {
        TriggerScanBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            ApiError::new(req_id.0.clone(), "bad_request", format!("invalid JSON body: {e}"))
        })?
    };
    let region = match body.region.as_deref() {
        Some(raw) => Some(raw.parse::<Region>().map_err(|e| {
            ApiError::new(req_id.0.clone(), "validation_error", e.to_string())
        })?),
        None => None,
    };

    let run = start_background_run(
        &state.pool,
        &state.service,
        &state.run_lock,
        "api",
        region,
    )
    .await
    .map_err(|e| match e {
        StartRunError::Busy => ApiError::new(
            req_id.0.clone(),
            "conflict",
            "a scan is already running",
        ),
        StartRunError::Db(db) => map_db_error(req_id.0.clone(), &db),
    })?;

    tracing::info!(run_id = run.id, region = %run.region, "scan triggered via api");

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: ScanRunItem::from(run),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
