//! Search-interest lookup.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use trendscout_core::{retry_with_backoff, InterestSummary, Region, RetryPolicy};

use crate::error::TrendError;
use crate::scorer::round2;

const SERVICE: &str = "interest";
/// Three months of daily points.
const TIMEFRAME: &str = "today 3-m";
/// Size of the "recent" and "prior" windows used for velocity.
const VELOCITY_WINDOW: usize = 30;

#[async_trait]
pub trait InterestSource: Send + Sync {
    /// Looks up interest for an already-cleaned keyword.
    ///
    /// `Ok(None)` means the source has no data for the keyword.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError`] when the lookup itself fails.
    async fn lookup(
        &self,
        keyword: &str,
        region: Region,
    ) -> Result<Option<InterestSummary>, TrendError>;
}

/// Used when no interest service is configured. Never does I/O.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterestSource;

#[async_trait]
impl InterestSource for NoInterestSource {
    async fn lookup(
        &self,
        _keyword: &str,
        _region: Region,
    ) -> Result<Option<InterestSummary>, TrendError> {
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct InterestResponse {
    #[serde(default)]
    values: Vec<f64>,
}

/// HTTP client for a search-interest proxy exposing
/// `GET /interest?keyword=&geo=&timeframe=` → `{"values": [..]}`.
pub struct HttpInterestClient {
    client: reqwest::Client,
    url: String,
    retry: RetryPolicy,
}

impl HttpInterestClient {
    /// # Errors
    ///
    /// Returns [`TrendError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64, retry: RetryPolicy) -> Result<Self, TrendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/interest", base_url.trim_end_matches('/')),
            retry,
        })
    }

    async fn fetch_series(&self, keyword: &str, region: Region) -> Result<Option<Vec<f64>>, TrendError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("keyword", keyword),
                ("geo", region.geo()),
                ("timeframe", TIMEFRAME),
            ])
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TrendError::RateLimited { service: SERVICE });
        }
        if !status.is_success() {
            return Err(TrendError::UnexpectedStatus {
                status: status.as_u16(),
                service: SERVICE,
            });
        }

        let body: InterestResponse =
            response
                .json()
                .await
                .map_err(|e| TrendError::InvalidResponse {
                    service: SERVICE,
                    reason: e.to_string(),
                })?;
        Ok(Some(body.values))
    }
}

#[async_trait]
impl InterestSource for HttpInterestClient {
    async fn lookup(
        &self,
        keyword: &str,
        region: Region,
    ) -> Result<Option<InterestSummary>, TrendError> {
        let series = retry_with_backoff(self.retry, "interest_lookup", || {
            self.fetch_series(keyword, region)
        })
        .await?;

        let summary = series.and_then(|values| summarize_series(keyword, &values));
        match &summary {
            Some(s) => tracing::info!(
                keyword,
                volume = s.current_volume,
                velocity = s.velocity,
                "interest data found"
            ),
            None => tracing::debug!(keyword, "no interest data"),
        }
        Ok(summary)
    }
}

/// Summarises an interest time series (oldest first).
///
/// Velocity compares the mean of the last 30 points with the mean of the
/// 30 before them (or everything before them when fewer than 60 points
/// exist). It is `0` with fewer than 30 points or an empty/zero prior
/// window. Returns `None` for an empty series.
#[must_use]
pub fn summarize_series(keyword: &str, values: &[f64]) -> Option<InterestSummary> {
    let last = *values.last()?;
    let max = values.iter().copied().fold(f64::MIN, f64::max);

    let velocity = if values.len() >= VELOCITY_WINDOW {
        let split = values.len() - VELOCITY_WINDOW;
        let recent = mean(&values[split..]);
        let prior_start = split.saturating_sub(VELOCITY_WINDOW);
        match mean(&values[prior_start..split]) {
            Some(prev) if prev > 0.0 => recent.map_or(0.0, |r| round2((r - prev) / prev * 100.0)),
            _ => 0.0,
        }
    } else {
        0.0
    };

    Some(InterestSummary {
        keyword: keyword.to_string(),
        current_volume: truncate(last),
        average_volume: mean(values).map_or(0, truncate),
        max_volume: truncate(max),
        velocity,
        has_data: true,
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let len = values.len() as f64;
    Some(values.iter().sum::<f64>() / len)
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(value: f64) -> i32 {
    value as i32
}
