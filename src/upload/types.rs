//! Upload session state and media upload wire types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::traits::RateLimitStatus;

/// Poll interval assumed when a pending response omits `check_after_secs`.
pub const DEFAULT_CHECK_AFTER_SECS: u64 = 5;

/// Media category, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaCategory {
    /// Still image attached to a post.
    #[serde(rename = "tweet_image")]
    Image,
    /// Animated GIF attached to a post.
    #[serde(rename = "tweet_gif")]
    AnimatedGif,
    /// Video attached to a post.
    #[serde(rename = "tweet_video")]
    Video,
    /// Video attached to a direct message.
    #[serde(rename = "dm_video")]
    DirectMessageVideo,
    /// Subtitle track.
    #[serde(rename = "subtitles")]
    Subtitles,
}

impl MediaCategory {
    /// Wire value of the `media_category` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "tweet_image",
            Self::AnimatedGif => "tweet_gif",
            Self::Video => "tweet_video",
            Self::DirectMessageVideo => "dm_video",
            Self::Subtitles => "subtitles",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-reported stage of asynchronous media processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    /// Queued, not started.
    Pending,
    /// Transcoding in progress.
    InProgress,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error.
    Failed,
}

impl ProcessingState {
    /// Returns true for `Succeeded` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Error reported by the service for a failed processing job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaError {
    /// Service error code.
    pub code: i64,
    /// Service error name.
    pub name: String,
    /// Service error message.
    pub message: String,
}

impl From<MediaError> for ApiError {
    fn from(error: MediaError) -> Self {
        Self::MediaProcessing {
            code: error.code,
            name: error.name,
            message: error.message,
        }
    }
}

/// Outcome of FINALIZE or STATUS.
///
/// `Immediate` means the service returned no processing info: the media is
/// usable as soon as FINALIZE returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Synchronously complete.
    Immediate,
    /// Processing has not finished yet.
    Pending {
        /// `Pending` or `InProgress`.
        state: ProcessingState,
        /// Server-advised wait before the next status check.
        check_after_secs: u64,
        /// Server-reported progress, if any.
        progress_percent: Option<u8>,
    },
    /// Processing finished.
    Terminal {
        /// `Succeeded` or `Failed`.
        state: ProcessingState,
        /// Error details for `Failed`.
        error: Option<MediaError>,
    },
}

impl ProcessingOutcome {
    /// Returns true unless more polling is required.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }

    /// The reported processing state, if the service sent one.
    #[must_use]
    pub const fn state(&self) -> Option<ProcessingState> {
        match self {
            Self::Immediate => None,
            Self::Pending { state, .. } | Self::Terminal { state, .. } => Some(*state),
        }
    }

    pub(crate) fn from_info(info: Option<ProcessingInfo>) -> Self {
        let Some(info) = info else {
            return Self::Immediate;
        };
        if info.state.is_terminal() {
            Self::Terminal {
                state: info.state,
                error: info.error,
            }
        } else {
            Self::Pending {
                state: info.state,
                check_after_secs: info.check_after_secs.unwrap_or(DEFAULT_CHECK_AFTER_SECS),
                progress_percent: info.progress_percent,
            }
        }
    }
}

/// One in-flight or completed chunked upload.
///
/// Created by [`initialize`](super::ChunkedUploadCoordinator::initialize) and
/// mutated only through the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    media_id: String,
    media_type: String,
    category: MediaCategory,
    shared: bool,
    total_bytes: u64,
    bytes_sent: u64,
    next_segment: u32,
    processing: Option<ProcessingOutcome>,
    expires_after_secs: Option<u64>,
    rate_limit: Option<RateLimitStatus>,
}

impl UploadSession {
    pub(crate) fn new(
        media_id: String,
        media_type: &str,
        category: MediaCategory,
        shared: bool,
        total_bytes: u64,
    ) -> Self {
        Self {
            media_id,
            media_type: media_type.to_string(),
            category,
            shared,
            total_bytes,
            bytes_sent: 0,
            next_segment: 0,
            processing: None,
            expires_after_secs: None,
            rate_limit: None,
        }
    }

    /// Server-assigned media identifier.
    #[must_use]
    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    /// MIME type declared at INIT.
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Media category declared at INIT.
    #[must_use]
    pub const fn category(&self) -> MediaCategory {
        self.category
    }

    /// Whether the media may be shared across direct messages.
    #[must_use]
    pub const fn shared(&self) -> bool {
        self.shared
    }

    /// Declared payload size.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Bytes acknowledged by the service so far.
    #[must_use]
    pub const fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Bytes still to append.
    #[must_use]
    pub const fn remaining_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.bytes_sent)
    }

    /// Segment index following the last successful append.
    #[must_use]
    pub const fn next_segment_index(&self) -> u32 {
        self.next_segment
    }

    /// Latest processing outcome; `None` until FINALIZE succeeds.
    #[must_use]
    pub const fn processing(&self) -> Option<&ProcessingOutcome> {
        self.processing.as_ref()
    }

    /// Seconds until the uploaded media expires, as last reported.
    #[must_use]
    pub const fn expires_after_secs(&self) -> Option<u64> {
        self.expires_after_secs
    }

    /// Rate-limit window reported with the most recent response.
    #[must_use]
    pub const fn rate_limit(&self) -> Option<RateLimitStatus> {
        self.rate_limit
    }

    /// Returns true once the media is usable or has failed for good.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.processing
            .as_ref()
            .is_some_and(ProcessingOutcome::is_terminal)
    }

    pub(crate) fn record_append(&mut self, segment_index: u32, len: u64) {
        self.bytes_sent += len;
        self.next_segment = segment_index.saturating_add(1);
    }

    pub(crate) fn record_processing(&mut self, outcome: ProcessingOutcome) {
        self.processing = Some(outcome);
    }

    pub(crate) fn record_response(
        &mut self,
        expires_after_secs: Option<u64>,
        rate_limit: Option<RateLimitStatus>,
    ) {
        if expires_after_secs.is_some() {
            self.expires_after_secs = expires_after_secs;
        }
        if rate_limit.is_some() {
            self.rate_limit = rate_limit;
        }
    }
}

/// Body of an INIT, FINALIZE or STATUS response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MediaUploadResponse {
    #[serde(default)]
    pub media_id: Option<u64>,
    #[serde(default)]
    pub media_id_string: Option<String>,
    #[serde(default)]
    pub expires_after_secs: Option<u64>,
    #[serde(default)]
    pub processing_info: Option<ProcessingInfo>,
}

impl MediaUploadResponse {
    pub fn media_id(&self) -> Option<String> {
        self.media_id_string
            .clone()
            .or_else(|| self.media_id.map(|id| id.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProcessingInfo {
    pub state: ProcessingState,
    #[serde(default)]
    pub check_after_secs: Option<u64>,
    #[serde(default)]
    pub progress_percent: Option<u8>,
    #[serde(default)]
    pub error: Option<MediaError>,
}
