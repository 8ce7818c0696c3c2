//! Long-lived streaming connections.
//!
//! Each connection runs on its own tokio task: open → read → frame → decode →
//! dispatch. Handler calls for one connection are strictly sequential;
//! separate connections share only the executor.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio_util::codec::Decoder;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::codec::{FrameError, Framing, MessageCodec};
use super::filter::FilterStreamOptions;
use crate::error::ApiError;
use crate::traits::{ApiRequest, ByteStream, RequestExecutor};

/// Default public streaming base URL.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://stream.twitter.com/1.1";
/// Default user streaming base URL.
pub const DEFAULT_USER_BASE_URL: &str = "https://userstream.twitter.com/1.1";

const PUBLIC_PATH: &str = "statuses/filter.json";
const USER_PATH: &str = "user.json";

/// Which streaming endpoint a connection targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// Public filter stream.
    Public,
    /// Per-user stream.
    User,
}

impl EndpointKind {
    /// Lower-case name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::User => "user",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconnect-with-backoff after transport failures.
///
/// `max_attempts = 0` disables reconnection. Protocol rejections and
/// cancellation never trigger a reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Consecutive reconnect attempts allowed.
    pub max_attempts: u32,
    /// Delay before the first reconnect.
    pub initial_backoff: Duration,
    /// Upper bound on the delay.
    pub max_backoff: Duration,
}

impl ReconnectPolicy {
    /// Create a disabled policy with default backoff bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the first delay.
    #[must_use]
    pub const fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Set the delay cap.
    #[must_use]
    pub const fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Delay before reconnect `attempt` (1-based): doubles each time, capped.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_backoff: Duration::from_secs(5),
            max_backoff: Duration::from_secs(320),
        }
    }
}

/// Configuration for [`StreamConsumer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Base URL of the public stream.
    pub public_base_url: String,
    /// Base URL of the user stream.
    pub user_base_url: String,
    /// Reconnect behaviour.
    pub reconnect: ReconnectPolicy,
}

impl StreamConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the public stream base URL.
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }

    /// Set the user stream base URL.
    #[must_use]
    pub fn with_user_base_url(mut self, url: impl Into<String>) -> Self {
        self.user_base_url = url.into();
        self
    }

    /// Set the reconnect policy.
    #[must_use]
    pub const fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            user_base_url: DEFAULT_USER_BASE_URL.to_string(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Context passed to the handler with every message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMetadata {
    /// Connection the message arrived on.
    pub connection_id: Uuid,
    /// Endpoint of that connection.
    pub endpoint: EndpointKind,
    /// 1-based position of the message on this connection.
    pub sequence: u64,
    /// Raw bytes of the message.
    pub raw: Bytes,
    /// Decode failure for this frame only; the message is `None` when set.
    pub error: Option<ApiError>,
}

/// Why a read loop stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The connection was cancelled.
    Cancelled,
    /// The server ended the response body.
    ServerClosed,
}

/// Totals reported when a connection's read loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Messages decoded and handed to the handler.
    pub messages_dispatched: u64,
    /// Frames that failed to decode.
    pub decode_failures: u64,
    /// Reconnects performed.
    pub reconnects: u32,
    /// Why the loop stopped.
    pub reason: StopReason,
}

/// Handle to one open streaming connection.
///
/// Dropping the handle does not stop the connection; call
/// [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct StreamConnection {
    id: Uuid,
    endpoint: EndpointKind,
    filter: Option<FilterStreamOptions>,
    token: CancellationToken,
    done: CancellationToken,
    task: JoinHandle<Result<StreamSummary, ApiError>>,
}

impl StreamConnection {
    /// Connection id used in logs and [`MessageMetadata`].
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Endpoint this connection targets.
    #[must_use]
    pub const fn endpoint(&self) -> EndpointKind {
        self.endpoint
    }

    /// Filters applied when the connection opened.
    #[must_use]
    pub const fn filter(&self) -> Option<&FilterStreamOptions> {
        self.filter.as_ref()
    }

    /// Request termination. Idempotent; sibling connections are unaffected.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true once the read loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Resolves once the read loop has exited, for any reason.
    ///
    /// Borrows the handle, so it can be raced in `select!` before
    /// [`join`](Self::join) collects the summary.
    pub async fn closed(&self) {
        self.done.cancelled().await;
    }

    /// Wait for the read loop to end.
    ///
    /// # Errors
    ///
    /// Returns the transport, protocol or framing error that closed the
    /// connection.
    pub async fn join(self) -> Result<StreamSummary, ApiError> {
        self.task.await.unwrap_or_else(|e| {
            Err(ApiError::Transport {
                message: format!("stream task ended abnormally: {e}"),
            })
        })
    }
}

/// Opens and drives streaming connections.
#[derive(Debug)]
pub struct StreamConsumer<E: ?Sized> {
    executor: Arc<E>,
    config: StreamConfig,
}

impl<E: RequestExecutor + ?Sized + 'static> StreamConsumer<E> {
    /// Create a consumer.
    #[must_use]
    pub const fn new(executor: Arc<E>, config: StreamConfig) -> Self {
        Self { executor, config }
    }

    /// Get the consumer configuration.
    #[must_use]
    pub const fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Open the public filter stream.
    ///
    /// `handler` receives each decoded message, or `None` with
    /// `metadata.error` set when a value fails to decode. Must be called from
    /// within a tokio runtime.
    pub fn open_public_stream<T, H>(
        &self,
        filter: &FilterStreamOptions,
        handler: H,
    ) -> StreamConnection
    where
        T: DeserializeOwned + Send + 'static,
        H: FnMut(Option<T>, &MessageMetadata) + Send + 'static,
    {
        let url = join_url(&self.config.public_base_url, PUBLIC_PATH);
        self.open(EndpointKind::Public, url, Some(filter.clone()), handler)
    }

    /// Open the user stream; without a filter no filter parameters are sent.
    ///
    /// Same handler contract as
    /// [`open_public_stream`](Self::open_public_stream).
    pub fn open_user_stream<T, H>(
        &self,
        filter: Option<&FilterStreamOptions>,
        handler: H,
    ) -> StreamConnection
    where
        T: DeserializeOwned + Send + 'static,
        H: FnMut(Option<T>, &MessageMetadata) + Send + 'static,
    {
        let url = join_url(&self.config.user_base_url, USER_PATH);
        self.open(EndpointKind::User, url, filter.cloned(), handler)
    }

    /// Cancel a connection opened by any consumer.
    pub fn cancel(&self, connection: &StreamConnection) {
        connection.cancel();
    }

    fn open<T, H>(
        &self,
        endpoint: EndpointKind,
        url: String,
        filter: Option<FilterStreamOptions>,
        handler: H,
    ) -> StreamConnection
    where
        T: DeserializeOwned + Send + 'static,
        H: FnMut(Option<T>, &MessageMetadata) + Send + 'static,
    {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        let framing = match &filter {
            Some(f) if f.delimited => Framing::Length,
            _ => Framing::Lines,
        };
        let request = ApiRequest::get(url)
            .with_params(filter.as_ref().map(FilterStreamOptions::to_parameters).unwrap_or_default());

        tracing::info!(connection_id = %id, endpoint = %endpoint, url = %request.url, "Opening stream connection");

        let reader = ConnectionReader {
            id,
            endpoint,
            framing,
            executor: Arc::clone(&self.executor),
            policy: self.config.reconnect,
            token: token.clone(),
            handler,
            sequence: 0,
            messages_dispatched: 0,
            decode_failures: 0,
            reconnects: 0,
            _message: std::marker::PhantomData,
        };
        let done = CancellationToken::new();
        let guard = done.clone().drop_guard();
        let task = tokio::spawn(async move {
            let _guard = guard;
            reader.run(request).await
        });

        StreamConnection {
            id,
            endpoint,
            filter,
            token,
            done,
            task,
        }
    }
}

/// State owned by one connection's task.
struct ConnectionReader<E: ?Sized, T, H> {
    id: Uuid,
    endpoint: EndpointKind,
    framing: Framing,
    executor: Arc<E>,
    policy: ReconnectPolicy,
    token: CancellationToken,
    handler: H,
    sequence: u64,
    messages_dispatched: u64,
    decode_failures: u64,
    reconnects: u32,
    _message: std::marker::PhantomData<fn() -> T>,
}

impl<E, T, H> ConnectionReader<E, T, H>
where
    E: RequestExecutor + ?Sized,
    T: DeserializeOwned,
    H: FnMut(Option<T>, &MessageMetadata),
{
    async fn run(mut self, request: ApiRequest) -> Result<StreamSummary, ApiError> {
        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            let received_before = self.sequence;
            let opened = tokio::select! {
                biased;
                () = self.token.cancelled() => return Ok(self.finish(StopReason::Cancelled, start)),
                opened = self.executor.open_stream(request.clone()) => opened,
            };
            let result = match opened {
                Ok(stream) => self.read(stream).await,
                Err(e) => Err(e),
            };

            let error = match result {
                Ok(reason) => return Ok(self.finish(reason, start)),
                Err(e) => e,
            };

            if self.sequence > received_before {
                attempt = 0;
            }
            if !error.is_retryable() || attempt >= self.policy.max_attempts || self.token.is_cancelled() {
                tracing::error!(
                    connection_id = %self.id,
                    endpoint = %self.endpoint,
                    error = %error,
                    messages = self.messages_dispatched,
                    "Stream connection failed"
                );
                return Err(error);
            }

            attempt += 1;
            self.reconnects += 1;
            let delay = self.policy.backoff_for(attempt);
            tracing::warn!(
                connection_id = %self.id,
                endpoint = %self.endpoint,
                error = %error,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Reconnecting stream"
            );
            tokio::select! {
                biased;
                () = self.token.cancelled() => return Ok(self.finish(StopReason::Cancelled, start)),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn read(&mut self, mut stream: ByteStream) -> Result<StopReason, ApiError> {
        let mut codec = MessageCodec::new(self.framing);
        let mut buffer = BytesMut::new();

        loop {
            let next = tokio::select! {
                biased;
                () = self.token.cancelled() => return Ok(StopReason::Cancelled),
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    buffer.extend_from_slice(&chunk);
                    while let Some(frame) = codec.decode(&mut buffer).map_err(framing_error)? {
                        if self.token.is_cancelled() {
                            return Ok(StopReason::Cancelled);
                        }
                        self.dispatch(&frame);
                    }
                }
                Some(Err(e)) => return Err(e),
                None => {
                    while let Some(frame) = codec.decode_eof(&mut buffer).map_err(framing_error)? {
                        if self.token.is_cancelled() {
                            return Ok(StopReason::Cancelled);
                        }
                        self.dispatch(&frame);
                    }
                    return Ok(StopReason::ServerClosed);
                }
            }
        }
    }

    /// Decode every whitespace-separated value in `frame` and hand each to
    /// the handler. A value that fails to decode is reported once and the
    /// rest of the frame is skipped.
    fn dispatch(&mut self, frame: &Bytes) {
        let mut values = serde_json::Deserializer::from_slice(frame).into_iter::<T>();
        loop {
            if self.token.is_cancelled() {
                return;
            }
            let begin = values.byte_offset();
            let Some(decoded) = values.next() else {
                return;
            };
            self.sequence += 1;

            match decoded {
                Ok(message) => {
                    let raw = frame.slice(begin..values.byte_offset());
                    let metadata = self.metadata(&raw);
                    self.messages_dispatched += 1;
                    (self.handler)(Some(message), &metadata);
                }
                Err(e) => {
                    self.decode_failures += 1;
                    tracing::warn!(
                        connection_id = %self.id,
                        sequence = self.sequence,
                        error = %e,
                        "Failed to decode stream message"
                    );
                    let mut metadata = self.metadata(&frame.slice(begin..));
                    metadata.error = Some(ApiError::Decode {
                        message: e.to_string(),
                    });
                    (self.handler)(None, &metadata);
                    return;
                }
            }
        }
    }

    fn metadata(&self, raw: &Bytes) -> MessageMetadata {
        MessageMetadata {
            connection_id: self.id,
            endpoint: self.endpoint,
            sequence: self.sequence,
            raw: raw.slice_ref(raw.trim_ascii()),
            error: None,
        }
    }

    fn finish(&self, reason: StopReason, start: Instant) -> StreamSummary {
        tracing::info!(
            connection_id = %self.id,
            endpoint = %self.endpoint,
            reason = ?reason,
            messages = self.messages_dispatched,
            decode_failures = self.decode_failures,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Stream connection closed"
        );
        StreamSummary {
            messages_dispatched: self.messages_dispatched,
            decode_failures: self.decode_failures,
            reconnects: self.reconnects,
            reason,
        }
    }
}

fn framing_error(error: FrameError) -> ApiError {
    match error {
        FrameError::Io(e) => ApiError::Transport {
            message: e.to_string(),
        },
        other => ApiError::Decode {
            message: other.to_string(),
        },
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{path}", base.trim_end_matches('/'))
}
