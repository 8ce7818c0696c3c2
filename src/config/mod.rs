//! Configuration management.
//!
//! This module handles:
//! - Environment variable loading
//! - Configuration validation
//! - Default value handling
//! - Derivation of the per-component configs used by the transport,
//!   upload and streaming layers
//!
//! # Example
//!
//! ```
//! use birdwire::config::{Config, SecretString};
//!
//! // Use Config::from_env() in production
//! let config = Config {
//!     access_token: Some(SecretString::new("AAAA-example-token")),
//!     ..Config::default()
//! };
//!
//! let debug = format!("{config:?}");
//! assert!(debug.contains("<REDACTED>"));
//! assert!(!debug.contains("AAAA-example-token"));
//! ```

mod secret;
mod validation;

pub use secret::SecretString;
pub use validation::{
    validate_config, MAX_MIN_POLL_INTERVAL_SECS, MAX_RECONNECTS, MAX_STREAM_READ_TIMEOUT_MS,
    MAX_TIMEOUT_MS, MIN_TIMEOUT_MS,
};

use std::time::Duration;

use crate::error::ConfigError;
use crate::stream::{ReconnectPolicy, StreamConfig};
use crate::transport::HttpConfig;
use crate::upload::{UploadConfig, MAX_CHUNK_BYTES};

/// Default upload API base URL.
pub const DEFAULT_UPLOAD_BASE_URL: &str = crate::upload::DEFAULT_UPLOAD_BASE_URL;

/// Default public streaming base URL.
pub const DEFAULT_STREAM_BASE_URL: &str = crate::stream::DEFAULT_PUBLIC_BASE_URL;

/// Default user streaming base URL.
pub const DEFAULT_USER_STREAM_BASE_URL: &str = crate::stream::DEFAULT_USER_BASE_URL;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = crate::transport::DEFAULT_TIMEOUT_MS;

/// Default stream read timeout in milliseconds.
///
/// The service sends a keep-alive newline roughly every 30 seconds, so three
/// missed keep-alives mark a stalled connection.
pub const DEFAULT_STREAM_READ_TIMEOUT_MS: u64 = 90_000;

/// Default minimum interval between processing status checks.
pub const DEFAULT_MIN_POLL_INTERVAL_SECS: u64 = 1;

/// Default number of stream reconnect attempts (disabled).
pub const DEFAULT_STREAM_MAX_RECONNECTS: u32 = 0;

/// Application configuration.
///
/// Use [`Config::from_env`] to load configuration from environment variables.
/// The access token uses [`SecretString`] to prevent accidental logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Pre-issued bearer token attached to every request, if any.
    pub access_token: Option<SecretString>,
    /// Base URL of the media upload API.
    pub upload_base_url: String,
    /// Base URL of the public streaming API.
    pub stream_base_url: String,
    /// Base URL of the user streaming API.
    pub user_stream_base_url: String,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: String,
    /// Timeout for ordinary request/response calls in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum silence on a streaming connection in milliseconds.
    pub stream_read_timeout_ms: u64,
    /// Chunk size used when the engine slices a payload itself.
    pub upload_chunk_bytes: usize,
    /// Lower bound for the processing poll interval in seconds.
    pub min_poll_interval_secs: u64,
    /// Upper bound on total processing wait in seconds (`None` = unbounded).
    pub max_processing_wait_secs: Option<u64>,
    /// Reconnect attempts after a streaming transport failure.
    pub stream_max_reconnects: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: None,
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.into(),
            stream_base_url: DEFAULT_STREAM_BASE_URL.into(),
            user_stream_base_url: DEFAULT_USER_STREAM_BASE_URL.into(),
            log_level: DEFAULT_LOG_LEVEL.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            stream_read_timeout_ms: DEFAULT_STREAM_READ_TIMEOUT_MS,
            upload_chunk_bytes: MAX_CHUNK_BYTES,
            min_poll_interval_secs: DEFAULT_MIN_POLL_INTERVAL_SECS,
            max_processing_wait_secs: None,
            stream_max_reconnects: DEFAULT_STREAM_MAX_RECONNECTS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `BIRDWIRE_ACCESS_TOKEN`: bearer token attached to requests
    /// - `BIRDWIRE_UPLOAD_BASE_URL` (default: `https://upload.twitter.com/1.1`)
    /// - `BIRDWIRE_STREAM_BASE_URL` (default: `https://stream.twitter.com/1.1`)
    /// - `BIRDWIRE_USER_STREAM_BASE_URL` (default: `https://userstream.twitter.com/1.1`)
    /// - `LOG_LEVEL` (default: `info`)
    /// - `REQUEST_TIMEOUT_MS` (default: `30000`)
    /// - `STREAM_READ_TIMEOUT_MS` (default: `90000`)
    /// - `UPLOAD_CHUNK_BYTES` (default: `524288`)
    /// - `MIN_POLL_INTERVAL_SECS` (default: `1`)
    /// - `MAX_PROCESSING_WAIT_SECS` (default: unbounded)
    /// - `STREAM_MAX_RECONNECTS` (default: `0`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a numeric variable does not parse or any
    /// value fails validation (see [`validate_config`]).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let access_token = std::env::var("BIRDWIRE_ACCESS_TOKEN")
            .ok()
            .map(SecretString::new);

        let config = Self {
            access_token,
            upload_base_url: env_or("BIRDWIRE_UPLOAD_BASE_URL", DEFAULT_UPLOAD_BASE_URL),
            stream_base_url: env_or("BIRDWIRE_STREAM_BASE_URL", DEFAULT_STREAM_BASE_URL),
            user_stream_base_url: env_or(
                "BIRDWIRE_USER_STREAM_BASE_URL",
                DEFAULT_USER_STREAM_BASE_URL,
            ),
            log_level: env_or("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            request_timeout_ms: parse_env("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?,
            stream_read_timeout_ms: parse_env(
                "STREAM_READ_TIMEOUT_MS",
                DEFAULT_STREAM_READ_TIMEOUT_MS,
            )?,
            upload_chunk_bytes: parse_env("UPLOAD_CHUNK_BYTES", MAX_CHUNK_BYTES)?,
            min_poll_interval_secs: parse_env(
                "MIN_POLL_INTERVAL_SECS",
                DEFAULT_MIN_POLL_INTERVAL_SECS,
            )?,
            max_processing_wait_secs: parse_optional_env("MAX_PROCESSING_WAIT_SECS")?,
            stream_max_reconnects: parse_env(
                "STREAM_MAX_RECONNECTS",
                DEFAULT_STREAM_MAX_RECONNECTS,
            )?,
        };

        validate_config(&config)?;
        Ok(config)
    }

    /// Transport settings for [`HttpExecutor`](crate::transport::HttpExecutor).
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        let config = HttpConfig::new()
            .with_timeout_ms(self.request_timeout_ms)
            .with_stream_read_timeout_ms(self.stream_read_timeout_ms);
        match &self.access_token {
            Some(token) => config.with_access_token(token.clone()),
            None => config,
        }
    }

    /// Settings for [`ChunkedUploadCoordinator`](crate::upload::ChunkedUploadCoordinator).
    #[must_use]
    pub fn upload_config(&self) -> UploadConfig {
        let config = UploadConfig::new()
            .with_base_url(&self.upload_base_url)
            .with_chunk_size(self.upload_chunk_bytes)
            .with_min_poll_interval(Duration::from_secs(self.min_poll_interval_secs));
        match self.max_processing_wait_secs {
            Some(secs) => config.with_max_processing_wait(Duration::from_secs(secs)),
            None => config,
        }
    }

    /// Settings for [`StreamConsumer`](crate::stream::StreamConsumer).
    #[must_use]
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig::new()
            .with_public_base_url(&self.stream_base_url)
            .with_user_base_url(&self.user_stream_base_url)
            .with_reconnect(ReconnectPolicy::new().with_max_attempts(self.stream_max_reconnects))
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

/// Parse an environment variable, using a default if not set.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    parse_optional_env(name).map(|value| value.unwrap_or(default))
}

/// Parse an environment variable that has no default.
fn parse_optional_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    std::env::var(name).map_or(Ok(None), |val| {
        val.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a non-negative integer".into(),
        })
    })
}
