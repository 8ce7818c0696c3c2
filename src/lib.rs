//! birdwire
//!
//! Protocol engine for a social-platform REST/streaming SDK. It covers the
//! three parts of the client that carry real state or concurrency:
//!
//! - [`upload`]: the chunked media upload state machine
//!   (`INIT` → `APPEND`* → `FINALIZE` → `STATUS`*)
//! - [`stream`]: long-lived streaming connections with per-message dispatch
//!   and independent cancellation
//! - [`entities`]: ordering and overlap resolution of positional text
//!   annotations
//!
//! HTTP is abstracted behind [`traits::RequestExecutor`];
//! [`transport::HttpExecutor`] is the `reqwest` implementation.
//!
//! # Architecture
//!
//! ```text
//!  caller ──▶ ChunkedUploadCoordinator ──┐
//!                                        ├──▶ RequestExecutor ──▶ service
//!  caller ◀── StreamConsumer (task/conn) ┘
//!
//!  entities JSON ──▶ coalesce ──▶ ordered, non-overlapping entities
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod direct_message;
pub mod entities;
pub mod error;
pub mod stream;
pub mod traits;
pub mod transport;
pub mod upload;

#[cfg(test)]
mod test_utils;
