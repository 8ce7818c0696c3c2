//! Blocking facade over [`ChunkedUploadCoordinator`].
//!
//! Runs the same async state machine on a private current-thread runtime, so
//! step ordering and state transitions are identical to the async API. Must
//! not be called from inside an async runtime.

use std::io;

use bytes::Bytes;
use tokio::runtime::{Builder, Runtime};

use super::coordinator::ChunkedUploadCoordinator;
use super::types::{MediaCategory, ProcessingOutcome, UploadSession};
use crate::error::UploadError;
use crate::traits::{PollTimer, RequestExecutor, TokioTimer};

/// Thread-blocking upload coordinator.
#[derive(Debug)]
pub struct BlockingUploadCoordinator<E: ?Sized, T = TokioTimer> {
    inner: ChunkedUploadCoordinator<E, T>,
    runtime: Runtime,
}

impl<E: RequestExecutor + ?Sized, T: PollTimer> BlockingUploadCoordinator<E, T> {
    /// Wrap an async coordinator.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the private runtime cannot be built.
    pub fn new(inner: ChunkedUploadCoordinator<E, T>) -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { inner, runtime })
    }

    /// The wrapped async coordinator.
    #[must_use]
    pub const fn inner(&self) -> &ChunkedUploadCoordinator<E, T> {
        &self.inner
    }

    /// Blocking [`initialize`](ChunkedUploadCoordinator::initialize).
    ///
    /// # Errors
    ///
    /// See [`ChunkedUploadCoordinator::initialize`].
    pub fn initialize(
        &self,
        media_type: &str,
        total_bytes: u64,
        category: MediaCategory,
        shared: bool,
    ) -> Result<UploadSession, UploadError> {
        self.runtime
            .block_on(self.inner.initialize(media_type, total_bytes, category, shared))
    }

    /// Blocking [`append_chunk`](ChunkedUploadCoordinator::append_chunk).
    ///
    /// # Errors
    ///
    /// See [`ChunkedUploadCoordinator::append_chunk`].
    pub fn append_chunk(
        &self,
        session: &mut UploadSession,
        segment_index: u32,
        chunk: Bytes,
    ) -> Result<(), UploadError> {
        self.runtime
            .block_on(self.inner.append_chunk(session, segment_index, chunk))
    }

    /// Blocking [`finalize`](ChunkedUploadCoordinator::finalize).
    ///
    /// # Errors
    ///
    /// See [`ChunkedUploadCoordinator::finalize`].
    pub fn finalize(&self, session: &mut UploadSession) -> Result<ProcessingOutcome, UploadError> {
        self.runtime.block_on(self.inner.finalize(session))
    }

    /// Blocking [`check_status`](ChunkedUploadCoordinator::check_status).
    ///
    /// # Errors
    ///
    /// See [`ChunkedUploadCoordinator::check_status`].
    pub fn check_status(
        &self,
        session: &mut UploadSession,
    ) -> Result<ProcessingOutcome, UploadError> {
        self.runtime.block_on(self.inner.check_status(session))
    }

    /// Blocking [`await_processing`](ChunkedUploadCoordinator::await_processing).
    ///
    /// # Errors
    ///
    /// See [`ChunkedUploadCoordinator::await_processing`].
    pub fn await_processing(
        &self,
        session: &mut UploadSession,
    ) -> Result<ProcessingOutcome, UploadError> {
        self.runtime.block_on(self.inner.await_processing(session))
    }

    /// Blocking [`upload`](ChunkedUploadCoordinator::upload).
    ///
    /// # Errors
    ///
    /// See [`ChunkedUploadCoordinator::upload`].
    pub fn upload(
        &self,
        media_type: &str,
        category: MediaCategory,
        shared: bool,
        data: Bytes,
    ) -> Result<UploadSession, UploadError> {
        self.runtime
            .block_on(self.inner.upload(media_type, category, shared, data))
    }
}
