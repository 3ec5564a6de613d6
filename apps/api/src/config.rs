use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// S3 / MinIO settings for raw PDF archival.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset: reports are kept in memory only.
    pub database_url: Option<String>,
    /// Unset: raw PDFs are not archived.
    pub s3: Option<S3Config>,
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub port: u16,
    pub rust_log: String,
    /// Worker-pool size for batches and the cap on concurrent model calls.
    pub max_concurrency: usize,
    pub ai_timeout: Duration,
    pub ai_max_attempts: u32,
    pub ai_backoff_base: Duration,
    pub ai_backoff_max: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let anthropic_api_key = require_env("ANTHROPIC_API_KEY")?;
        if !anthropic_api_key.starts_with("sk-ant-") {
            bail!("ANTHROPIC_API_KEY has an invalid format (expected an 'sk-ant-' prefix)");
        }

        let max_concurrency: usize = parse_env("MAX_CONCURRENCY", 4)?;
        if max_concurrency == 0 {
            bail!("MAX_CONCURRENCY must be at least 1");
        }
        let ai_max_attempts: u32 = parse_env("AI_MAX_ATTEMPTS", 3)?;
        if ai_max_attempts == 0 {
            bail!("AI_MAX_ATTEMPTS must be at least 1");
        }

        // S3_BUCKET switches archival on; the rest is then required.
        let s3 = match std::env::var("S3_BUCKET") {
            Ok(bucket) => Some(S3Config {
                bucket,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            Err(_) => None,
        };

        Ok(Config {
            database_url: std::env::var("DATABASE_URL").ok(),
            s3,
            anthropic_api_key,
            anthropic_model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_concurrency,
            ai_timeout: Duration::from_secs(parse_env("AI_TIMEOUT_SECS", 120)?),
            ai_max_attempts,
            ai_backoff_base: Duration::from_millis(parse_env("AI_BACKOFF_BASE_MS", 1000)?),
            ai_backoff_max: Duration::from_millis(parse_env("AI_BACKOFF_MAX_MS", 8000)?),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
