//! Chunked media upload state machine.
//!
//! Drives INIT → APPEND* → FINALIZE → STATUS* against the media upload
//! endpoint. Every operation is a single round trip; nothing is retried here.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Deserialize;

use super::config::UploadConfig;
use super::types::{
    MediaCategory, MediaError, MediaUploadResponse, ProcessingOutcome, ProcessingState,
    UploadSession,
};
use super::MAX_CHUNK_BYTES;
use crate::error::{ApiError, UploadError, UploadPhase};
use crate::traits::{ApiRequest, ApiResponse, PollTimer, RequestExecutor, TokioTimer};

const UPLOAD_PATH: &str = "media/upload.json";

/// One planned chunk of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Zero-based segment index.
    pub index: u32,
    /// Byte offset into the payload.
    pub offset: usize,
    /// Chunk length.
    pub len: usize,
}

/// Split `total` bytes into consecutive chunks of at most `chunk_size`.
///
/// The last chunk holds the remainder. Indices start at zero with no gaps.
/// A zero `chunk_size` yields no chunks.
#[must_use]
pub fn plan_chunks(total: usize, chunk_size: usize) -> Vec<ChunkPlan> {
    if chunk_size == 0 {
        return Vec::new();
    }
    (0..total)
        .step_by(chunk_size)
        .zip(0u32..)
        .map(|(offset, index)| ChunkPlan {
            index,
            offset,
            len: chunk_size.min(total - offset),
        })
        .collect()
}

/// Error body returned by the service on rejected calls.
#[derive(Debug, Deserialize)]
struct ServiceErrors {
    #[serde(default)]
    errors: Vec<ServiceError>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

/// Drives chunked uploads through a [`RequestExecutor`].
///
/// The coordinator holds no per-upload state; every call takes the
/// [`UploadSession`] it advances, so one coordinator can drive many uploads
/// concurrently.
#[derive(Debug)]
pub struct ChunkedUploadCoordinator<E: ?Sized, T = TokioTimer> {
    executor: Arc<E>,
    timer: T,
    config: UploadConfig,
}

impl<E: RequestExecutor + ?Sized> ChunkedUploadCoordinator<E, TokioTimer> {
    /// Create a coordinator that sleeps with [`TokioTimer`].
    #[must_use]
    pub fn new(executor: Arc<E>, config: UploadConfig) -> Self {
        Self {
            executor,
            timer: TokioTimer,
            config,
        }
    }
}

impl<E: RequestExecutor + ?Sized, T: PollTimer> ChunkedUploadCoordinator<E, T> {
    /// Replace the poll timer.
    #[must_use]
    pub fn with_timer<U: PollTimer>(self, timer: U) -> ChunkedUploadCoordinator<E, U> {
        ChunkedUploadCoordinator {
            executor: self.executor,
            timer,
            config: self.config,
        }
    }

    /// Get the coordinator configuration.
    #[must_use]
    pub const fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Get the poll timer.
    #[must_use]
    pub const fn timer(&self) -> &T {
        &self.timer
    }

    fn endpoint(&self) -> String {
        format!("{}/{UPLOAD_PATH}", self.config.base_url.trim_end_matches('/'))
    }

    /// Start a session (`INIT`).
    ///
    /// # Errors
    ///
    /// Returns an [`UploadError`] in the `init` phase if `total_bytes` is zero,
    /// the service rejects the call, or the response carries no media id.
    pub async fn initialize(
        &self,
        media_type: &str,
        total_bytes: u64,
        category: MediaCategory,
        shared: bool,
    ) -> Result<UploadSession, UploadError> {
        let phase = UploadPhase::Init;
        if total_bytes == 0 {
            return Err(invalid(phase, "total_bytes must be greater than zero"));
        }
        if media_type.is_empty() {
            return Err(invalid(phase, "media_type must not be empty"));
        }

        let mut request = ApiRequest::post(self.endpoint())
            .with_param("command", "INIT")
            .with_param("total_bytes", total_bytes)
            .with_param("media_type", media_type)
            .with_param("media_category", category);
        if shared {
            request = request.with_param("shared", true);
        }

        let response = self.send(phase, request).await?;
        let body: MediaUploadResponse = decode(phase, &response)?;
        let media_id = body.media_id().ok_or_else(|| {
            UploadError::new(
                phase,
                ApiError::Decode {
                    message: "INIT response carried no media id".into(),
                },
            )
        })?;

        let mut session = UploadSession::new(media_id, media_type, category, shared, total_bytes);
        session.record_response(body.expires_after_secs, response.rate_limit());

        tracing::info!(
            media_id = %session.media_id(),
            media_type,
            category = %category,
            total_bytes,
            "Upload initialized"
        );
        Ok(session)
    }

    /// Send one chunk (`APPEND`).
    ///
    /// `segment_index` is tracked by the caller; the service rejects
    /// out-of-order indices. `bytes_sent` advances only on success.
    ///
    /// # Errors
    ///
    /// Returns an [`UploadError`] in the `append` phase if the chunk is empty,
    /// larger than [`MAX_CHUNK_BYTES`], overruns `total_bytes`, or the call
    /// fails.
    pub async fn append_chunk(
        &self,
        session: &mut UploadSession,
        segment_index: u32,
        chunk: Bytes,
    ) -> Result<(), UploadError> {
        let phase = UploadPhase::Append;
        let len = chunk.len();
        if len == 0 {
            return Err(invalid(phase, "chunk must not be empty"));
        }
        if len > MAX_CHUNK_BYTES {
            return Err(invalid(
                phase,
                format!("chunk of {len} bytes exceeds the {MAX_CHUNK_BYTES} byte ceiling"),
            ));
        }
        let len = len as u64;
        if len > session.remaining_bytes() {
            return Err(invalid(
                phase,
                format!(
                    "chunk of {len} bytes overruns total_bytes ({} of {} sent)",
                    session.bytes_sent(),
                    session.total_bytes()
                ),
            ));
        }

        let request = ApiRequest::post(self.endpoint())
            .with_param("command", "APPEND")
            .with_param("media_id", session.media_id())
            .with_param("segment_index", segment_index)
            .with_binary("media", chunk);

        let response = self.send(phase, request).await?;
        session.record_append(segment_index, len);
        session.record_response(None, response.rate_limit());

        tracing::debug!(
            media_id = %session.media_id(),
            segment_index,
            bytes_sent = session.bytes_sent(),
            total_bytes = session.total_bytes(),
            "Chunk appended"
        );
        Ok(())
    }

    /// Complete the upload (`FINALIZE`).
    ///
    /// # Errors
    ///
    /// Returns an [`UploadError`] in the `finalize` phase if not every byte
    /// was appended or the call fails.
    pub async fn finalize(
        &self,
        session: &mut UploadSession,
    ) -> Result<ProcessingOutcome, UploadError> {
        let phase = UploadPhase::Finalize;
        if session.remaining_bytes() != 0 {
            return Err(invalid(
                phase,
                format!(
                    "only {} of {} bytes appended",
                    session.bytes_sent(),
                    session.total_bytes()
                ),
            ));
        }

        let request = ApiRequest::post(self.endpoint())
            .with_param("command", "FINALIZE")
            .with_param("media_id", session.media_id());

        let response = self.send(phase, request).await?;
        let outcome = apply_outcome(phase, session, &response)?;

        tracing::info!(
            media_id = %session.media_id(),
            state = ?outcome.state(),
            "Upload finalized"
        );
        Ok(outcome)
    }

    /// Query processing progress once (`STATUS`).
    ///
    /// # Errors
    ///
    /// Returns an [`UploadError`] in the `status` phase if the call fails.
    pub async fn check_status(
        &self,
        session: &mut UploadSession,
    ) -> Result<ProcessingOutcome, UploadError> {
        let phase = UploadPhase::Status;
        let request = ApiRequest::get(self.endpoint())
            .with_param("command", "STATUS")
            .with_param("media_id", session.media_id());

        let response = self.send(phase, request).await?;
        let outcome = apply_outcome(phase, session, &response)?;

        tracing::debug!(
            media_id = %session.media_id(),
            state = ?outcome.state(),
            "Processing status checked"
        );
        Ok(outcome)
    }

    /// Poll until processing reaches a terminal state.
    ///
    /// Sleeps `max(check_after_secs, min_poll_interval)` between checks. A
    /// session that completed synchronously is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an [`UploadError`] in the `status` phase carrying
    /// [`ApiError::MediaProcessing`] if processing failed,
    /// [`ApiError::Timeout`] if the configured maximum wait would be exceeded,
    /// or the transport error of a failed status check. The session keeps its
    /// last known state so polling can be resumed.
    pub async fn await_processing(
        &self,
        session: &mut UploadSession,
    ) -> Result<ProcessingOutcome, UploadError> {
        let phase = UploadPhase::Status;
        let start = Instant::now();
        let mut waited = Duration::ZERO;

        loop {
            let outcome = session
                .processing()
                .cloned()
                .ok_or_else(|| invalid(phase, "upload has not been finalized"))?;

            match outcome {
                ProcessingOutcome::Immediate
                | ProcessingOutcome::Terminal {
                    state: ProcessingState::Succeeded,
                    ..
                } => {
                    tracing::info!(
                        media_id = %session.media_id(),
                        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "Media ready"
                    );
                    return Ok(outcome);
                }
                ProcessingOutcome::Terminal { error, .. } => {
                    let error = error.unwrap_or_else(|| MediaError {
                        code: 0,
                        name: "Unknown".into(),
                        message: "processing failed without error details".into(),
                    });
                    tracing::error!(
                        media_id = %session.media_id(),
                        code = error.code,
                        name = %error.name,
                        message = %error.message,
                        "Media processing failed"
                    );
                    return Err(UploadError::new(phase, error.into()));
                }
                ProcessingOutcome::Pending {
                    check_after_secs,
                    progress_percent,
                    ..
                } => {
                    let delay = Duration::from_secs(check_after_secs).max(self.config.min_poll_interval);
                    if let Some(limit) = self.config.max_processing_wait {
                        if waited.saturating_add(delay) > limit {
                            tracing::warn!(
                                media_id = %session.media_id(),
                                waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                                "Processing wait limit reached"
                            );
                            return Err(UploadError::new(
                                phase,
                                ApiError::Timeout {
                                    timeout_ms: u64::try_from(limit.as_millis())
                                        .unwrap_or(u64::MAX),
                                },
                            ));
                        }
                    }

                    tracing::debug!(
                        media_id = %session.media_id(),
                        delay_secs = delay.as_secs(),
                        progress_percent,
                        "Waiting for media processing"
                    );
                    self.timer.sleep(delay).await;
                    waited = waited.saturating_add(delay);
                    self.check_status(session).await?;
                }
            }
        }
    }

    /// Upload an in-memory payload end to end.
    ///
    /// Slices `data` into chunks of the configured size, then runs
    /// initialize, append for each chunk, finalize and, when required,
    /// [`await_processing`](Self::await_processing).
    ///
    /// # Errors
    ///
    /// Returns the first [`UploadError`] encountered, tagged with its phase.
    pub async fn upload(
        &self,
        media_type: &str,
        category: MediaCategory,
        shared: bool,
        data: Bytes,
    ) -> Result<UploadSession, UploadError> {
        let mut session = self
            .initialize(media_type, data.len() as u64, category, shared)
            .await?;

        for chunk in plan_chunks(data.len(), self.config.chunk_size) {
            let bytes = data.slice(chunk.offset..chunk.offset + chunk.len);
            self.append_chunk(&mut session, chunk.index, bytes).await?;
        }

        let outcome = self.finalize(&mut session).await?;
        if !outcome.is_terminal() || outcome.state() == Some(ProcessingState::Failed) {
            self.await_processing(&mut session).await?;
        }
        Ok(session)
    }

    async fn send(&self, phase: UploadPhase, request: ApiRequest) -> Result<ApiResponse, UploadError> {
        let response = self.executor.execute(request).await.map_err(|e| {
            tracing::error!(phase = %phase, error = %e, "Upload request failed");
            UploadError::new(phase, e)
        })?;

        if !response.is_success() {
            let message = service_message(&response);
            tracing::warn!(phase = %phase, status = response.status, message = %message, "Upload request rejected");
            return Err(UploadError::new(
                phase,
                ApiError::Protocol {
                    status: response.status,
                    message,
                },
            ));
        }
        Ok(response)
    }
}

fn apply_outcome(
    phase: UploadPhase,
    session: &mut UploadSession,
    response: &ApiResponse,
) -> Result<ProcessingOutcome, UploadError> {
    let body: MediaUploadResponse = decode(phase, response)?;
    let outcome = ProcessingOutcome::from_info(body.processing_info);
    session.record_processing(outcome.clone());
    session.record_response(body.expires_after_secs, response.rate_limit());
    Ok(outcome)
}

fn decode<T: serde::de::DeserializeOwned>(
    phase: UploadPhase,
    response: &ApiResponse,
) -> Result<T, UploadError> {
    serde_json::from_slice(&response.body).map_err(|e| {
        UploadError::new(
            phase,
            ApiError::Decode {
                message: format!("Failed to parse {phase} response: {e}"),
            },
        )
    })
}

fn invalid(phase: UploadPhase, message: impl Into<String>) -> UploadError {
    UploadError::new(
        phase,
        ApiError::InvalidRequest {
            message: message.into(),
        },
    )
}

/// Best-effort extraction of the service's error message.
fn service_message(response: &ApiResponse) -> String {
    match serde_json::from_slice::<ServiceErrors>(&response.body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed
            .errors
            .iter()
            .map(|e| match e.code {
                Some(code) => format!("{code}: {}", e.message),
                None => e.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Ok(ServiceErrors {
            error: Some(message),
            ..
        }) => message,
        _ => response.body_text(),
    }
}
