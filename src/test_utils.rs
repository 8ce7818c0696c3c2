//! Test utilities and fake collaborators.
//!
//! This module provides shared testing infrastructure:
//! - [`ScriptedExecutor`]: replays buffered responses in order and records requests
//! - [`StreamScript`]: replays stream openings in order and records requests
//! - [`FakeTimer`]: records poll sleeps without waiting
//! - Response fixtures for the media upload protocol
//!
//! Only compiled for tests (`#[cfg(test)]`).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use serde_json::json;
use tokio::sync::mpsc;

use crate::error::ApiError;
use crate::traits::{
    ApiRequest, ApiResponse, ByteStream, MockRequestExecutor, PollTimer, RequestExecutor,
};
use crate::upload::ProcessingState;

/// Executor that answers `execute` calls from a fixed script.
///
/// Running past the end of the script yields a transport error, so a test
/// that sends one request too many fails loudly.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedExecutor {
    /// Create an executor that replays `responses` in order.
    #[must_use]
    pub fn new(responses: Vec<Result<ApiResponse, ApiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ApiError::Transport {
                    message: "script exhausted".into(),
                })
            })
    }

    async fn open_stream(&self, _request: ApiRequest) -> Result<ByteStream, ApiError> {
        Err(ApiError::InvalidRequest {
            message: "ScriptedExecutor does not stream".into(),
        })
    }
}

/// Executor that answers `open_stream` calls from a fixed script.
pub struct StreamScript {
    streams: Mutex<VecDeque<Result<ByteStream, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl StreamScript {
    /// Create an executor that hands out `streams` in order.
    #[must_use]
    pub fn new(streams: Vec<Result<ByteStream, ApiError>>) -> Self {
        Self {
            streams: Mutex::new(streams.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Stream requests received so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestExecutor for StreamScript {
    async fn execute(&self, _request: ApiRequest) -> Result<ApiResponse, ApiError> {
        Err(ApiError::InvalidRequest {
            message: "StreamScript only streams".into(),
        })
    }

    async fn open_stream(&self, request: ApiRequest) -> Result<ByteStream, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.streams.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ApiError::Protocol {
                status: 503,
                message: "script exhausted".into(),
            })
        })
    }
}

/// A body that yields `chunks` and then ends.
pub fn finite_stream<I, C>(chunks: I) -> ByteStream
where
    I: IntoIterator<Item = C>,
    C: Into<Bytes>,
{
    let chunks: Vec<Result<Bytes, ApiError>> = chunks.into_iter().map(|c| Ok(c.into())).collect();
    Box::pin(stream::iter(chunks))
}

/// A body fed by the returned sender; it ends when the sender is dropped.
///
/// Sending fails once the consumer has dropped the stream.
pub fn channel_stream() -> (mpsc::UnboundedSender<Result<Bytes, ApiError>>, ByteStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let body = stream::unfold(rx, |mut rx| async move {
        let item = rx.recv().await?;
        Some((item, rx))
    });
    (tx, Box::pin(body))
}

/// Create a mock executor whose every `execute` call fails with `error`.
#[must_use]
pub fn mock_executor_error(error: ApiError) -> MockRequestExecutor {
    let mut mock = MockRequestExecutor::new();
    mock.expect_execute()
        .returning(move |_| Err(error.clone()));
    mock
}

/// [`PollTimer`] that returns immediately and records each requested delay.
#[derive(Debug, Default)]
pub struct FakeTimer {
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeTimer {
    /// Delays requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl PollTimer for FakeTimer {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

fn json_response(status: u16, body: &serde_json::Value) -> ApiResponse {
    ApiResponse::new(status, serde_json::to_vec(body).unwrap())
}

/// Successful `INIT` response.
#[must_use]
pub fn init_response(media_id: &str) -> ApiResponse {
    json_response(
        200,
        &json!({
            "media_id": media_id.parse::<u64>().unwrap_or_default(),
            "media_id_string": media_id,
            "expires_after_secs": 86_400
        }),
    )
}

/// Empty `APPEND` acknowledgement.
#[must_use]
pub fn no_content() -> ApiResponse {
    ApiResponse::new(204, Bytes::new())
}

/// `FINALIZE` response announcing pending processing.
#[must_use]
pub fn finalize_pending(media_id: &str, check_after_secs: u64) -> ApiResponse {
    json_response(
        201,
        &json!({
            "media_id_string": media_id,
            "expires_after_secs": 86_400,
            "processing_info": {
                "state": "pending",
                "check_after_secs": check_after_secs
            }
        }),
    )
}

/// `STATUS` response in `state`.
#[must_use]
pub fn status_response(
    state: ProcessingState,
    check_after_secs: Option<u64>,
    progress_percent: Option<u8>,
) -> ApiResponse {
    let mut info = json!({ "state": state });
    if let Some(secs) = check_after_secs {
        info["check_after_secs"] = json!(secs);
    }
    if let Some(percent) = progress_percent {
        info["progress_percent"] = json!(percent);
    }
    json_response(200, &json!({ "processing_info": info }))
}

/// `STATUS` response reporting failed processing.
#[must_use]
pub fn failed_status(code: i64, name: &str, message: &str) -> ApiResponse {
    json_response(
        200,
        &json!({
            "processing_info": {
                "state": "failed",
                "progress_percent": 100,
                "error": { "code": code, "name": name, "message": message }
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_scripted_executor_replays_and_records() {
        let executor = ScriptedExecutor::new(vec![Ok(no_content())]);
        let response = executor
            .execute(ApiRequest::get("https://example.com/a"))
            .await
            .unwrap();
        assert_eq!(response.status, 204);

        let err = executor
            .execute(ApiRequest::get("https://example.com/b"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(executor.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_channel_stream_ends_when_sender_dropped() {
        let (tx, mut body) = channel_stream();
        tx.send(Ok(Bytes::from_static(b"a"))).unwrap();
        drop(tx);
        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"a"));
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn test_mock_executor_error() {
        let mock = mock_executor_error(ApiError::Timeout { timeout_ms: 10 });
        let err = mock
            .execute(ApiRequest::get("https://example.com"))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Timeout { timeout_ms: 10 });
    }

    #[tokio::test]
    async fn test_fake_timer_records() {
        let timer = FakeTimer::default();
        timer.sleep(Duration::from_secs(3)).await;
        assert_eq!(timer.sleeps(), vec![Duration::from_secs(3)]);
    }
}
