//! Configuration module for the article processor.
//!
//! All configuration is loaded once from environment variables (and an optional
//! `.env` file) with sensible defaults. The feed URLs are required.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "Invalid ARTICLES_LOG_FORMAT '{}', expected 'text' or 'json'",
                other
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Optional file that receives a copy of every log line
    pub log_path: Option<PathBuf>,
    pub log_format: LogFormat,
    /// URL of the article list feed
    pub list_url: String,
    /// Base URL of the single article feed, the external id is appended
    pub detail_url: String,
    /// Seconds between reconciliation cycles, 0 disables polling
    pub poll_interval_secs: u64,
    /// Timeout for every upstream HTTP request
    pub feed_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("ARTICLES_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid ARTICLES_BIND_ADDR format: {}", e)))?;

        let db_path = env::var("ARTICLES_DB_PATH")
            .unwrap_or_else(|_| "./data/articles.sqlite".to_string())
            .into();

        let log_level = env::var("ARTICLES_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_path = env::var("ARTICLES_LOG_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let log_format = match env::var("ARTICLES_LOG_FORMAT") {
            Ok(value) => LogFormat::parse(&value)?,
            Err(_) => LogFormat::Text,
        };

        let list_url = required_url("ARTICLES_LIST_URL")?;
        let detail_url = required_url("ARTICLES_DETAIL_URL")?;

        let poll_interval_secs = parse_secs("ARTICLES_POLL_INTERVAL_SECS", 60)?;
        let feed_timeout_secs = parse_secs("ARTICLES_FEED_TIMEOUT_SECS", 30)?;

        Ok(Self {
            bind_addr,
            db_path,
            log_level,
            log_path,
            log_format,
            list_url,
            detail_url,
            poll_interval_secs,
            feed_timeout_secs,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }
}

fn required_url(key: &str) -> Result<String, AppError> {
    let value = env::var(key)
        .map_err(|_| AppError::Config(format!("{} must be set", key)))?
        .trim()
        .to_string();

    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(AppError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            key, value
        )));
    }
    Ok(value)
}

fn parse_secs(key: &str, default: u64) -> Result<u64, AppError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a whole number of seconds", key))),
        Err(_) => Ok(default),
    }
}
