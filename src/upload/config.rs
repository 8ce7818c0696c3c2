//! Upload coordinator configuration.

use std::time::Duration;

use super::MAX_CHUNK_BYTES;

/// Default upload API base URL.
pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://upload.twitter.com/1.1";

/// Default lower bound for the processing poll interval.
pub const DEFAULT_MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for [`ChunkedUploadCoordinator`](super::ChunkedUploadCoordinator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// Base URL; `media/upload.json` is appended.
    pub base_url: String,
    /// Chunk size used by [`upload`](super::ChunkedUploadCoordinator::upload).
    pub chunk_size: usize,
    /// Lower bound applied to the server's `check_after_secs`.
    pub min_poll_interval: Duration,
    /// Upper bound on total time spent sleeping between status checks.
    pub max_processing_wait: Option<Duration>,
}

impl UploadConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the chunk size, clamped to `1..=MAX_CHUNK_BYTES`.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_CHUNK_BYTES);
        self
    }

    /// Set the minimum poll interval.
    #[must_use]
    pub const fn with_min_poll_interval(mut self, interval: Duration) -> Self {
        self.min_poll_interval = interval;
        self
    }

    /// Bound the total processing wait.
    #[must_use]
    pub const fn with_max_processing_wait(mut self, wait: Duration) -> Self {
        self.max_processing_wait = Some(wait);
        self
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            chunk_size: MAX_CHUNK_BYTES,
            min_poll_interval: DEFAULT_MIN_POLL_INTERVAL,
            max_processing_wait: None,
        }
    }
}
