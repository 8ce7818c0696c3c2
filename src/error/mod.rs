//! Error types for the birdwire protocol engine.
//!
//! This module defines a hierarchical error system:
//! - [`AppError`]: Top-level errors used by the binary
//! - [`ApiError`]: Failures talking to the remote service
//! - [`UploadError`]: An [`ApiError`] tagged with the upload phase it occurred in
//! - [`EntityError`]: Malformed positional annotations
//! - [`ConfigError`]: Configuration errors
//!
//! All errors implement `Send + Sync` for async compatibility.

use std::fmt;

use thiserror::Error;

/// Top-level application error.
///
/// Wraps all subsystem errors for unified handling at the binary boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote service error.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Upload error.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Entity coalescing error.
    #[error("Entity error: {0}")]
    Entity(#[from] EntityError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while talking to the remote service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connectivity failure (DNS, connection reset, broken body stream).
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// Request timed out.
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// The server answered but rejected the request.
    #[error("Protocol error (status {status}): {message}")]
    Protocol {
        /// HTTP status code returned by the server.
        status: u16,
        /// Server-provided message or raw body.
        message: String,
    },

    /// Asynchronous media processing ended in the `failed` state.
    #[error("Media processing failed: {code} {name} - {message}")]
    MediaProcessing {
        /// Server error code.
        code: i64,
        /// Server error name.
        name: String,
        /// Server error message.
        message: String,
    },

    /// A single message could not be decoded.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },

    /// A local precondition was violated before any request was sent.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of what's invalid.
        message: String,
    },
}

impl ApiError {
    /// Returns true for transport-class errors a caller may retry.
    ///
    /// This layer never retries on its own; the classification exists for
    /// callers building their own retry or reconnect policy.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    /// The HTTP status carried by a protocol error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Phase of the chunked upload protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadPhase {
    /// `INIT` command.
    Init,
    /// `APPEND` command.
    Append,
    /// `FINALIZE` command.
    Finalize,
    /// `STATUS` command (including the polling loop).
    Status,
}

impl UploadPhase {
    /// Lower-case phase name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Append => "append",
            Self::Finalize => "finalize",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An upload failure, tagged with the phase it occurred in.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("upload {phase} failed: {source}")]
pub struct UploadError {
    /// Phase that failed.
    pub phase: UploadPhase,
    /// Underlying cause.
    #[source]
    pub source: ApiError,
}

impl UploadError {
    /// Create a new upload error.
    #[must_use]
    pub const fn new(phase: UploadPhase, source: ApiError) -> Self {
        Self { phase, source }
    }

    /// Returns true if the cause was a transport-class failure.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        self.source.is_retryable()
    }
}

/// Errors raised while coalescing positional entities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// An entity's range is empty or inverted.
    #[error("Invalid {kind} span [{start}, {end})")]
    InvalidSpan {
        /// Entity kind name.
        kind: String,
        /// Reported start index.
        start: usize,
        /// Reported end index.
        end: usize,
    },
}

/// Configuration errors.
///
/// These errors represent failures in configuration loading and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required configuration is missing.
    #[error("Missing required: {var}")]
    MissingRequired {
        /// The missing variable name.
        var: String,
    },

    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },
}
