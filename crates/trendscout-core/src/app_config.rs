use std::net::SocketAddr;
use std::path::PathBuf;

use crate::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub sources_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub region: Region,
    pub cron: String,
    /// Queue one scan as soon as the server starts.
    pub run_on_start: bool,
    pub products_per_category: usize,
    pub top_n_limit: usize,
    pub hot_threshold: f64,
    pub ai_threshold: f64,
    pub lookup_budget: usize,
    pub lookup_spacing_min_ms: u64,
    pub lookup_spacing_max_ms: u64,
    pub archive_after_days: u32,
    pub archive_score_below: f64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub interest_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub discord_webhook_url: Option<String>,
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("sources_path", &self.sources_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("region", &self.region)
            .field("cron", &self.cron)
            .field("run_on_start", &self.run_on_start)
            .field("products_per_category", &self.products_per_category)
            .field("top_n_limit", &self.top_n_limit)
            .field("hot_threshold", &self.hot_threshold)
            .field("ai_threshold", &self.ai_threshold)
            .field("lookup_budget", &self.lookup_budget)
            .field("lookup_spacing_min_ms", &self.lookup_spacing_min_ms)
            .field("lookup_spacing_max_ms", &self.lookup_spacing_max_ms)
            .field("archive_after_days", &self.archive_after_days)
            .field("archive_score_below", &self.archive_score_below)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("interest_url", &self.interest_url)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field(
                "discord_webhook_url",
                &self.discord_webhook_url.as_ref().map(|_| "[redacted]"),
            )
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .finish()
    }
}
