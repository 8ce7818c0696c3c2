//! HTTP transport configuration.

#![allow(clippy::missing_const_for_fn)]

use crate::config::SecretString;

/// Default timeout for buffered requests in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Default maximum silence on a streaming body in milliseconds.
pub const DEFAULT_STREAM_READ_TIMEOUT_MS: u64 = 90_000;
/// Default connect timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("birdwire/", env!("CARGO_PKG_VERSION"));

/// Configuration for [`HttpExecutor`](super::HttpExecutor).
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout for buffered calls in milliseconds.
    pub timeout_ms: u64,
    /// Per-read timeout for streaming bodies in milliseconds.
    pub stream_read_timeout_ms: u64,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// User agent header.
    pub user_agent: String,
    /// Bearer token attached as `Authorization`, if any.
    pub access_token: Option<SecretString>,
}

impl HttpConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffered request timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the streaming read timeout.
    #[must_use]
    pub const fn with_stream_read_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.stream_read_timeout_ms = timeout_ms;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<SecretString>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            stream_read_timeout_ms: DEFAULT_STREAM_READ_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            access_token: None,
        }
    }
}
