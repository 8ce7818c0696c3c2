//! Chunked media upload.
//!
//! The upload protocol has four commands, all against `media/upload.json`:
//!
//! 1. `INIT` declares size, MIME type and category, and returns a media id
//! 2. `APPEND` sends one chunk as multipart with a zero-based `segment_index`
//! 3. `FINALIZE` completes the upload and may report asynchronous processing
//! 4. `STATUS` reports processing progress until it succeeds or fails
//!
//! [`ChunkedUploadCoordinator`] is the async API; [`BlockingUploadCoordinator`]
//! runs the same state machine for callers without a runtime.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use birdwire::transport::{HttpConfig, HttpExecutor};
//! use birdwire::upload::{ChunkedUploadCoordinator, MediaCategory, UploadConfig};
//!
//! # async fn run(video: bytes::Bytes) -> Result<(), Box<dyn std::error::Error>> {
//! let executor = Arc::new(HttpExecutor::new(HttpConfig::new())?);
//! let coordinator = ChunkedUploadCoordinator::new(executor, UploadConfig::new());
//!
//! let session = coordinator
//!     .upload("video/mp4", MediaCategory::Video, false, video)
//!     .await?;
//! println!("uploaded {}", session.media_id());
//! # Ok(())
//! # }
//! ```

mod blocking;
mod config;
mod coordinator;
mod types;

pub use blocking::BlockingUploadCoordinator;
pub use config::{UploadConfig, DEFAULT_MIN_POLL_INTERVAL, DEFAULT_UPLOAD_BASE_URL};
pub use coordinator::{plan_chunks, ChunkPlan, ChunkedUploadCoordinator};
pub use types::{
    MediaCategory, MediaError, ProcessingOutcome, ProcessingState, UploadSession,
    DEFAULT_CHECK_AFTER_SECS,
};

/// Largest chunk the service accepts in one `APPEND` (512 KiB).
pub const MAX_CHUNK_BYTES: usize = 512 * 1024;
