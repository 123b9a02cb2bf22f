use crate::app_config::{AppConfig, Environment};
use crate::region::Region;
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::str::FromStr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    }

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("TRENDSCOUT_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_as(
        "TRENDSCOUT_BIND_ADDR",
        &or_default("TRENDSCOUT_BIND_ADDR", "0.0.0.0:8000"),
    )?;
    let log_level = or_default("TRENDSCOUT_LOG_LEVEL", "info");
    let sources_path = PathBuf::from(or_default(
        "TRENDSCOUT_SOURCES_PATH",
        "./config/sources.yaml",
    ));

    let db_max_connections: u32 = parse_as(
        "TRENDSCOUT_DB_MAX_CONNECTIONS",
        &or_default("TRENDSCOUT_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "TRENDSCOUT_DB_MIN_CONNECTIONS",
        &or_default("TRENDSCOUT_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs: u64 = parse_as(
        "TRENDSCOUT_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("TRENDSCOUT_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let region: Region = parse_as("TRENDSCOUT_REGION", &or_default("TRENDSCOUT_REGION", "US"))?;
    let cron = or_default("TRENDSCOUT_CRON", "0 0 6 * * *");
    let run_on_start: bool = parse_as(
        "TRENDSCOUT_RUN_ON_START",
        &or_default("TRENDSCOUT_RUN_ON_START", "false"),
    )?;
    let products_per_category: usize = parse_as(
        "TRENDSCOUT_PRODUCTS_PER_CATEGORY",
        &or_default("TRENDSCOUT_PRODUCTS_PER_CATEGORY", "50"),
    )?;
    let top_n_limit: usize = parse_as("TRENDSCOUT_TOP_N", &or_default("TRENDSCOUT_TOP_N", "10"))?;
    let hot_threshold = parse_score(
        "TRENDSCOUT_HOT_THRESHOLD",
        &or_default("TRENDSCOUT_HOT_THRESHOLD", "70"),
    )?;
    let ai_threshold = parse_score(
        "TRENDSCOUT_AI_THRESHOLD",
        &or_default("TRENDSCOUT_AI_THRESHOLD", "60"),
    )?;
    let lookup_budget: usize = parse_as(
        "TRENDSCOUT_LOOKUP_BUDGET",
        &or_default("TRENDSCOUT_LOOKUP_BUDGET", "15"),
    )?;
    let lookup_spacing_min_ms: u64 = parse_as(
        "TRENDSCOUT_LOOKUP_SPACING_MIN_MS",
        &or_default("TRENDSCOUT_LOOKUP_SPACING_MIN_MS", "1000"),
    )?;
    let lookup_spacing_max_ms: u64 = parse_as(
        "TRENDSCOUT_LOOKUP_SPACING_MAX_MS",
        &or_default("TRENDSCOUT_LOOKUP_SPACING_MAX_MS", "3000"),
    )?;
    if lookup_spacing_max_ms < lookup_spacing_min_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "TRENDSCOUT_LOOKUP_SPACING_MAX_MS".to_string(),
            reason: format!(
                "must be >= TRENDSCOUT_LOOKUP_SPACING_MIN_MS ({lookup_spacing_min_ms})"
            ),
        });
    }
    let archive_after_days: u32 = parse_as(
        "TRENDSCOUT_ARCHIVE_AFTER_DAYS",
        &or_default("TRENDSCOUT_ARCHIVE_AFTER_DAYS", "30"),
    )?;
    let archive_score_below = parse_score(
        "TRENDSCOUT_ARCHIVE_SCORE_BELOW",
        &or_default("TRENDSCOUT_ARCHIVE_SCORE_BELOW", "50"),
    )?;

    let request_timeout_secs: u64 = parse_as(
        "TRENDSCOUT_REQUEST_TIMEOUT_SECS",
        &or_default("TRENDSCOUT_REQUEST_TIMEOUT_SECS", "30"),
    )?;
    let user_agent = or_default("TRENDSCOUT_USER_AGENT", DEFAULT_USER_AGENT);
    let max_retries: u32 = parse_as(
        "TRENDSCOUT_MAX_RETRIES",
        &or_default("TRENDSCOUT_MAX_RETRIES", "3"),
    )?;
    let retry_backoff_base_ms: u64 = parse_as(
        "TRENDSCOUT_RETRY_BACKOFF_BASE_MS",
        &or_default("TRENDSCOUT_RETRY_BACKOFF_BASE_MS", "1000"),
    )?;

    let interest_url = optional("TRENDSCOUT_INTEREST_URL");
    let gemini_api_key = optional("GEMINI_API_KEY");
    let gemini_model = or_default("GEMINI_MODEL", "gemini-pro");
    let discord_webhook_url = optional("DISCORD_WEBHOOK_URL");
    let api_keys = or_default("TRENDSCOUT_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        sources_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        region,
        cron,
        run_on_start,
        products_per_category,
        top_n_limit,
        hot_threshold,
        ai_threshold,
        lookup_budget,
        lookup_spacing_min_ms,
        lookup_spacing_max_ms,
        archive_after_days,
        archive_score_below,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        interest_url,
        gemini_api_key,
        gemini_model,
        discord_webhook_url,
        api_keys,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TRENDSCOUT_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

/// Parse a score threshold, which must lie on the `[0, 100]` scale.
fn parse_score(var: &str, raw: &str) -> Result<f64, ConfigError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("{value} is outside 0..=100"),
        });
    }
    Ok(value)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
