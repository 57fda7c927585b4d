//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use study_assistant_core::upload_rules::DEFAULT_MAX_UPLOAD_BYTES;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// Without a key every generator runs on its offline fallback.
    pub openai_api_key: Option<String>,
    pub quiz_model: String,
    pub flashcard_model: String,
    pub summary_model: String,
    pub explain_model: String,
    pub sst_model: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub token_ttl_days: i64,
    pub cors_origin: String,
    pub explain_max_passages: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:5000")?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        // --- Load Adapter-specific Settings ---
        let quiz_model = var_or("QUIZ_MODEL", "gpt-4o-mini");
        let flashcard_model = var_or("FLASHCARD_MODEL", "gpt-4o-mini");
        let summary_model = var_or("SUMMARY_MODEL", "gpt-4o-mini");
        let explain_model = var_or("EXPLAIN_MODEL", "gpt-4o-mini");
        let sst_model = var_or("SST_MODEL", "whisper-1");

        // --- Load Upload and Session Settings ---
        let upload_dir = PathBuf::from(var_or("UPLOAD_DIR", "./uploads"));
        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string())?;
        let token_ttl_days: i64 = parse_var("TOKEN_TTL_DAYS", "30")?;
        if token_ttl_days < 1 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_DAYS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:3000");
        let explain_max_passages = parse_var("EXPLAIN_MAX_PASSAGES", "8")?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            quiz_model,
            flashcard_model,
            summary_model,
            explain_model,
            sst_model,
            upload_dir,
            max_upload_bytes,
            token_ttl_days,
            cors_origin,
            explain_max_passages,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Reads `name` (or `default` when unset) and parses it into `T`.
fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(name, &var_or(name, default))
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}
