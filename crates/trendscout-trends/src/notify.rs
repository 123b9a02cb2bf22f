//! Run summary and error notifications.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use trendscout_core::{retry_with_backoff, Region, RetryPolicy, ScoredItem};

use crate::error::TrendError;

const SERVICE: &str = "discord";
const USERNAME: &str = "Trend Detective";
const FOOTER: &str = "trendscout";
const COLOR_HOT: u32 = 0xFF6B35;
const COLOR_QUIET: u32 = 0x4ECDC4;
const COLOR_ERROR: u32 = 0xFF0000;
const MAX_FIELDS: usize = 5;
const MAX_FIELD_NAME_CHARS: usize = 80;
const MAX_ERROR_CHARS: usize = 1800;

/// What a finished run reports.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary<'a> {
    pub region: Region,
    pub top_n: &'a [ScoredItem],
    /// Hot items across the full scored set, not only `top_n`.
    pub hot_count: usize,
    pub hot_threshold: f64,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// # Errors
    ///
    /// Returns [`TrendError`] if delivery fails.
    async fn notify_summary(&self, summary: &RunSummary<'_>) -> Result<(), TrendError>;

    /// # Errors
    ///
    /// Returns [`TrendError`] if delivery fails.
    async fn notify_error(&self, message: &str) -> Result<(), TrendError>;
}

/// Writes notifications to the log. Used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_summary(&self, summary: &RunSummary<'_>) -> Result<(), TrendError> {
        tracing::info!(
            region = %summary.region,
            items = summary.top_n.len(),
            hot = summary.hot_count,
            best = summary.top_n.first().map(|i| i.trend_score),
            "run summary"
        );
        Ok(())
    }

    async fn notify_error(&self, message: &str) -> Result<(), TrendError> {
        tracing::error!(message, "run failed");
        Ok(())
    }
}

/// Discord webhook notifier.
pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: String,
    retry: RetryPolicy,
}

impl DiscordNotifier {
    /// # Errors
    ///
    /// Returns [`TrendError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(webhook_url: &str, timeout_secs: u64, retry: RetryPolicy) -> Result<Self, TrendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.to_string(),
            retry,
        })
    }

    async fn post(&self, payload: &Value) -> Result<(), TrendError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TrendError::RateLimited { service: SERVICE });
        }
        if !status.is_success() {
            return Err(TrendError::UnexpectedStatus {
                status: status.as_u16(),
                service: SERVICE,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify_summary(&self, summary: &RunSummary<'_>) -> Result<(), TrendError> {
        let payload = summary_payload(summary);
        retry_with_backoff(self.retry, "discord_summary", || self.post(&payload)).await?;
        tracing::info!(items = summary.top_n.len(), "summary notification sent");
        Ok(())
    }

    async fn notify_error(&self, message: &str) -> Result<(), TrendError> {
        let payload = error_payload(message);
        retry_with_backoff(self.retry, "discord_error", || self.post(&payload)).await
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub(crate) fn summary_payload(summary: &RunSummary<'_>) -> Value {
    let items = summary.top_n;
    let highest = items
        .iter()
        .map(|i| i.trend_score)
        .fold(0.0_f64, f64::max);
    #[allow(clippy::cast_precision_loss)]
    let average = if items.is_empty() {
        0.0
    } else {
        items.iter().map(|i| i.trend_score).sum::<f64>() / items.len() as f64
    };

    let fields: Vec<Value> = items
        .iter()
        .take(MAX_FIELDS)
        .enumerate()
        .map(|(idx, item)| {
            let price = item.price.map_or_else(
                || "N/A".to_string(),
                |p| format!("{}{p:.2}", summary.region.currency_symbol()),
            );
            json!({
                "name": format!(
                    "#{} - {}",
                    idx + 1,
                    truncate_chars(&item.name, MAX_FIELD_NAME_CHARS)
                ),
                "value": format!(
                    "**Score:** {:.1}/100\n**Category:** {}\n**Price:** {price}\n\
                     **Search Volume:** {}\n[View listing]({})",
                    item.trend_score, item.category, item.search_volume, item.url
                ),
                "inline": false,
            })
        })
        .collect();

    json!({
        "username": USERNAME,
        "embeds": [{
            "title": "Daily Trend Report",
            "description": format!(
                "Found **{}** trending products ({})\n\
                 Hot products (score ≥{}): **{}**\n\
                 Highest score: **{highest:.1}/100**\n\
                 Average score: **{average:.1}/100**",
                items.len(),
                summary.region,
                summary.hot_threshold,
                summary.hot_count,
            ),
            "color": if summary.hot_count > 0 { COLOR_HOT } else { COLOR_QUIET },
            "fields": fields,
            "footer": { "text": FOOTER },
        }],
    })
}

pub(crate) fn error_payload(message: &str) -> Value {
    json!({
        "username": USERNAME,
        "embeds": [{
            "title": "Trend Detection Error",
            "description": format!(
                "An error occurred during trend detection:\n\n```{}```",
                truncate_chars(message, MAX_ERROR_CHARS)
            ),
            "color": COLOR_ERROR,
            "footer": { "text": FOOTER },
        }],
    })
}
