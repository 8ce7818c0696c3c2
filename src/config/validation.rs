//! Configuration validation.
//!
//! Keeps timeouts, chunk sizes and reconnect limits within ranges the remote
//! service and the engine can honour.

use super::Config;
use crate::error::ConfigError;
use crate::upload::MAX_CHUNK_BYTES;

/// Minimum allowed timeout in milliseconds (1 second).
pub const MIN_TIMEOUT_MS: u64 = 1000;

/// Maximum allowed request timeout in milliseconds (5 minutes).
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Maximum allowed stream read timeout in milliseconds (10 minutes).
pub const MAX_STREAM_READ_TIMEOUT_MS: u64 = 600_000;

/// Maximum allowed minimum poll interval in seconds.
pub const MAX_MIN_POLL_INTERVAL_SECS: u64 = 60;

/// Maximum allowed stream reconnect attempts.
pub const MAX_RECONNECTS: u32 = 10;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if any value is out of range:
/// - `BIRDWIRE_ACCESS_TOKEN`, when set, must not be empty
/// - base URLs must be absolute `http`/`https` URLs
/// - `REQUEST_TIMEOUT_MS` must be between 1000 and 300000
/// - `STREAM_READ_TIMEOUT_MS` must be between 1000 and 600000
/// - `UPLOAD_CHUNK_BYTES` must be between 1 and 524288
/// - `MIN_POLL_INTERVAL_SECS` must be at most 60
/// - `MAX_PROCESSING_WAIT_SECS`, when set, must be positive
/// - `STREAM_MAX_RECONNECTS` must be at most 10
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.access_token.as_ref().is_some_and(|t| t.is_empty()) {
        return Err(invalid("BIRDWIRE_ACCESS_TOKEN", "must not be empty"));
    }

    for (var, value) in [
        ("BIRDWIRE_UPLOAD_BASE_URL", &config.upload_base_url),
        ("BIRDWIRE_STREAM_BASE_URL", &config.stream_base_url),
        ("BIRDWIRE_USER_STREAM_BASE_URL", &config.user_stream_base_url),
    ] {
        validate_base_url(var, value)?;
    }

    if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&config.request_timeout_ms) {
        return Err(invalid(
            "REQUEST_TIMEOUT_MS",
            format!("must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS} ms"),
        ));
    }

    if !(MIN_TIMEOUT_MS..=MAX_STREAM_READ_TIMEOUT_MS).contains(&config.stream_read_timeout_ms) {
        return Err(invalid(
            "STREAM_READ_TIMEOUT_MS",
            format!("must be between {MIN_TIMEOUT_MS} and {MAX_STREAM_READ_TIMEOUT_MS} ms"),
        ));
    }

    if config.upload_chunk_bytes == 0 || config.upload_chunk_bytes > MAX_CHUNK_BYTES {
        return Err(invalid(
            "UPLOAD_CHUNK_BYTES",
            format!("must be between 1 and {MAX_CHUNK_BYTES}"),
        ));
    }

    if config.min_poll_interval_secs > MAX_MIN_POLL_INTERVAL_SECS {
        return Err(invalid(
            "MIN_POLL_INTERVAL_SECS",
            format!("must be at most {MAX_MIN_POLL_INTERVAL_SECS}"),
        ));
    }

    if config.max_processing_wait_secs == Some(0) {
        return Err(invalid("MAX_PROCESSING_WAIT_SECS", "must be positive"));
    }

    if config.stream_max_reconnects > MAX_RECONNECTS {
        return Err(invalid(
            "STREAM_MAX_RECONNECTS",
            format!("must be between 0 and {MAX_RECONNECTS}"),
        ));
    }

    Ok(())
}

fn validate_base_url(var: &str, value: &str) -> Result<(), ConfigError> {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(_) => Err(invalid(var, "scheme must be http or https")),
        Err(e) => Err(invalid(var, format!("not a valid URL: {e}"))),
    }
}

fn invalid(var: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.into(),
        reason: reason.into(),
    }
}
