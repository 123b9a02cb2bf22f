//! Optional generative-text notes for high-scoring items.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use trendscout_core::{retry_with_backoff, RetryPolicy};

use crate::error::TrendError;

const SERVICE: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[async_trait]
pub trait TextEnricher: Send + Sync {
    /// Returns a short note about the item, or `None` when nothing useful
    /// came back.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError`] when the call fails.
    async fn enrich(
        &self,
        name: &str,
        category: &str,
        price: Option<f64>,
        score: f64,
    ) -> Result<Option<String>, TrendError>;
}

/// Used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEnricher;

#[async_trait]
impl TextEnricher for NoopEnricher {
    async fn enrich(
        &self,
        _name: &str,
        _category: &str,
        _price: Option<f64>,
        _score: f64,
    ) -> Result<Option<String>, TrendError> {
        Ok(None)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`TrendError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Result<Self, TrendError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, model, timeout_secs, retry)
    }

    /// Same as [`GeminiClient::new`] against a different host.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Result<Self, TrendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: format!(
                "{}/v1beta/models/{model}:generateContent",
                base_url.trim_end_matches('/')
            ),
            retry,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<Option<String>, TrendError> {
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
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

        let body: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| TrendError::InvalidResponse {
                    service: SERVICE,
                    reason: e.to_string(),
                })?;

        Ok(first_text(body))
    }
}

#[async_trait]
impl TextEnricher for GeminiClient {
    async fn enrich(
        &self,
        name: &str,
        category: &str,
        price: Option<f64>,
        score: f64,
    ) -> Result<Option<String>, TrendError> {
        let prompt = build_prompt(name, category, price, score);
        let note = retry_with_backoff(self.retry, "gemini_generate", || self.generate(&prompt)).await?;
        if note.is_some() {
            tracing::info!(product = name, "text note generated");
        }
        Ok(note)
    }
}

fn first_text(body: GenerateResponse) -> Option<String> {
    body.candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|p| p.text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub(crate) fn build_prompt(name: &str, category: &str, price: Option<f64>, score: f64) -> String {
    let price = price.map_or_else(|| "Unknown".to_string(), |p| format!("{p:.2}"));
    format!(
        "As a dropshipping expert, analyze this product:\n\n\
         Product: {name}\n\
         Category: {category}\n\
         Price: {price}\n\
         Trend Score: {score}/100\n\n\
         Provide a brief analysis (2-3 sentences) covering:\n\
         1. Dropshipping viability\n\
         2. Target audience\n\
         3. Key selling points or concerns\n\n\
         Keep it concise and actionable."
    )
}
