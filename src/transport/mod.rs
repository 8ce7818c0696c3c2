//! HTTP transport.
//!
//! [`HttpExecutor`] is the production [`RequestExecutor`](crate::traits::RequestExecutor):
//! parameters go in the query string for `GET`, form-encoded for `POST`, and
//! as multipart text parts when a binary part is attached.

mod client;
mod config;

pub use client::HttpExecutor;
pub use config::{
    HttpConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_STREAM_READ_TIMEOUT_MS, DEFAULT_TIMEOUT_MS,
    DEFAULT_USER_AGENT,
};
