//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `HOROLOGE_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; when neither is set the API runs on in-memory storage)
//! - `HOROLOGE_HOST` - Bind address (default: 127.0.0.1)
//! - `HOROLOGE_PORT` - Listen port (default: 5000)
//! - `HOROLOGE_PUBLIC_URL` - Base URL used to build product image URLs
//!   (default: <http://localhost:5000>)
//! - `HOROLOGE_CLIENT_ORIGINS` - Comma-separated CORS origins
//! - `HOROLOGE_UPLOADS_DIR` - Directory served under `/uploads` (default: uploads)
//! - `HOROLOGE_TOKEN_TTL_HOURS` - Bearer token lifetime (default: 24)
//! - `HOROLOGE_DB_TIMEOUT_SECS` - Per-operation storage timeout (default: 5)
//! - `HOROLOGE_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_CLIENT_ORIGINS: &str =
    "http://localhost:3000,http://127.0.0.1:5173,http://localhost:5173";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `pretty` or `json`, got `{other}`")),
        }
    }
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` connection URL; `None` selects in-memory storage
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used to resolve product image paths
    pub public_url: String,
    /// Origins allowed to make credentialed CORS requests
    pub client_origins: Vec<HeaderValue>,
    /// Directory served under `/uploads`
    pub uploads_dir: PathBuf,
    /// Lifetime of issued bearer tokens
    pub token_ttl: chrono::TimeDelta,
    /// Upper bound on any single storage operation
    pub db_timeout: Duration,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            public_url: "http://localhost:5000".to_owned(),
            client_origins: parse_origins(DEFAULT_CLIENT_ORIGINS).unwrap_or_default(),
            uploads_dir: PathBuf::from("uploads"),
            token_ttl: chrono::TimeDelta::hours(24),
            db_timeout: Duration::from_secs(5),
            log_format: LogFormat::Pretty,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let client_origins = match get_optional_env("HOROLOGE_CLIENT_ORIGINS") {
            Some(raw) => parse_origins(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("HOROLOGE_CLIENT_ORIGINS".to_string(), e)
            })?,
            None => defaults.client_origins,
        };

        let token_ttl_hours: i64 = parse_env("HOROLOGE_TOKEN_TTL_HOURS", 24)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "HOROLOGE_TOKEN_TTL_HOURS".to_string(),
                "must be positive".to_string(),
            ));
        }

        Ok(Self {
            database_url: get_database_url("HOROLOGE_DATABASE_URL"),
            host: parse_env("HOROLOGE_HOST", defaults.host)?,
            port: parse_env("HOROLOGE_PORT", defaults.port)?,
            public_url: parse_public_url(&get_env_or_default(
                "HOROLOGE_PUBLIC_URL",
                &defaults.public_url,
            ))
            .map_err(|e| ConfigError::InvalidEnvVar("HOROLOGE_PUBLIC_URL".to_string(), e))?,
            client_origins,
            uploads_dir: get_optional_env("HOROLOGE_UPLOADS_DIR")
                .map_or(defaults.uploads_dir, PathBuf::from),
            token_ttl: chrono::TimeDelta::hours(token_ttl_hours),
            db_timeout: Duration::from_secs(parse_env("HOROLOGE_DB_TIMEOUT_SECS", 5)?),
            log_format: parse_env("HOROLOGE_LOG_FORMAT", defaults.log_format)?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", defaults.sentry_sample_rate)?,
            sentry_traces_sample_rate: parse_env(
                "SENTRY_TRACES_SAMPLE_RATE",
                defaults.sentry_traces_sample_rate,
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, using `default` when it is unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Validate the public base URL and strip any trailing slash.
fn parse_public_url(raw: &str) -> Result<String, String> {
    let url = url::Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("expected an http(s) URL, got `{raw}`"));
    }
    Ok(url.as_str().trim_end_matches('/').to_owned())
}

/// Split a comma-separated origin list into header values.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin.trim_end_matches('/'))
                .map_err(|e| format!("invalid origin `{origin}`: {e}"))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(config.token_ttl, chrono::TimeDelta::hours(24));
        assert_eq!(config.db_timeout, Duration::from_secs(5));
        assert!(config.database_url.is_none());
        assert_eq!(config.client_origins.len(), 3);
    }

    #[test]
    fn test_parse_origins_trims_and_skips_blanks() {
        let origins = parse_origins(" https://shop.example.com/ , ,http://localhost:3000").unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://shop.example.com");
        assert_eq!(origins[1], "http://localhost:3000");
    }

    #[test]
    fn test_parse_public_url() {
        assert_eq!(
            parse_public_url("https://api.example.com/").unwrap(),
            "https://api.example.com"
        );
        assert_eq!(
            parse_public_url("http://localhost:5000").unwrap(),
            "http://localhost:5000"
        );
        assert!(parse_public_url("localhost:5000").is_err());
        assert!(parse_public_url("ftp://files.example.com").is_err());
    }

    #[test]
    fn test_parse_origins_rejects_control_chars() {
        assert!(parse_origins("http://bad\norigin").is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u16 = parse_env("HOROLOGE_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
