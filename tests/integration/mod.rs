//! Integration tests for birdwire.
//!
//! These tests drive the public API against a local mock server:
//! - Chunked upload with asynchronous processing
//! - Streaming consumption, framing and cancellation
//! - Entity coalescing from service payloads

mod entity_coalescing;
mod stream_workflow;
mod upload_workflow;
