//! Streaming connections.
//!
//! [`StreamConsumer`] opens the public filter stream or the per-user stream,
//! splits the response body into messages with [`MessageCodec`], decodes each
//! one with `serde_json` and hands it to a caller-supplied handler. Every
//! connection runs on its own task and is cancelled independently.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use birdwire::stream::{FilterStreamOptions, MessageMetadata, StreamConfig, StreamConsumer};
//! use birdwire::transport::{HttpConfig, HttpExecutor};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = Arc::new(HttpExecutor::new(HttpConfig::new())?);
//! let consumer = StreamConsumer::new(executor, StreamConfig::new());
//!
//! let filter = FilterStreamOptions::new().with_track(["rust"]);
//! let connection = consumer.open_public_stream(
//!     &filter,
//!     |message: Option<serde_json::Value>, metadata: &MessageMetadata| {
//!         if let Some(message) = message {
//!             println!("{} {message}", metadata.sequence);
//!         }
//!     },
//! );
//!
//! connection.cancel();
//! let summary = connection.join().await?;
//! println!("{} messages", summary.messages_dispatched);
//! # Ok(())
//! # }
//! ```

mod codec;
mod consumer;
mod filter;

pub use codec::{FrameError, Framing, MessageCodec, MAX_FRAME_BYTES};
pub use consumer::{
    EndpointKind, MessageMetadata, ReconnectPolicy, StopReason, StreamConfig, StreamConnection,
    StreamConsumer, StreamSummary, DEFAULT_PUBLIC_BASE_URL, DEFAULT_USER_BASE_URL,
};
pub use filter::{FilterLevel, FilterStreamOptions, GeoCoordinates, StreamWith};
