//! Trait definitions for the engine's external collaborators.
//!
//! This module defines traits for:
//! - [`RequestExecutor`]: HTTP request execution (buffered and streaming)
//! - [`PollTimer`]: Suspension between processing status checks
//!
//! It also re-exports the request/response types from the `types` submodule.
//!
//! # Mocking
//!
//! Both traits are annotated with `#[cfg_attr(test, mockall::automock)]`
//! which generates mock implementations automatically for testing.

mod types;

pub use types::{
    ApiRequest, ApiResponse, BinaryPart, ByteStream, HttpMethod, RateLimitStatus,
};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ApiError;

/// Request execution abstraction.
///
/// Implementations must be safe for concurrent, independent use by many
/// upload sessions and stream connections at once.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Execute a request and buffer the whole response.
    ///
    /// Non-success statuses are returned as ordinary responses so callers can
    /// inspect the raw status and body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] or [`ApiError::Timeout`] on
    /// connectivity failure.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;

    /// Open a long-lived request and return its body as a chunk stream.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Protocol`] if the server answers with a
    /// non-success status, or a transport-class error if the connection
    /// cannot be established.
    async fn open_stream(&self, request: ApiRequest) -> Result<ByteStream, ApiError>;
}

/// Suspension primitive for the processing poll loop.
///
/// Only the calling task is suspended; worker threads stay free for other
/// uploads and streams.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PollTimer: Send + Sync {
    /// Suspend the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`PollTimer`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl PollTimer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
