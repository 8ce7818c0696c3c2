//! Request and response types shared across the collaborator seams.

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use futures_util::Stream;
use reqwest::header::HeaderMap;

use crate::error::ApiError;

/// A stream of raw body chunks from a long-lived response.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ApiError>> + Send>>;

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`: parameters are sent in the query string.
    Get,
    /// `POST`: parameters are sent form-encoded, or as multipart text parts
    /// when a binary part is attached.
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

/// A binary payload attached to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPart {
    /// Multipart field name.
    pub field: String,
    /// Raw bytes.
    pub bytes: Bytes,
}

/// A request handed to a [`RequestExecutor`](super::RequestExecutor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL without query string.
    pub url: String,
    /// Ordered request parameters.
    pub params: Vec<(String, String)>,
    /// Optional binary part (forces a multipart body).
    pub body: Option<BinaryPart>,
}

impl ApiRequest {
    /// Create a `GET` request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Create a `POST` request.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            body: None,
        }
    }

    /// Append a parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Append several parameters in order.
    #[must_use]
    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    /// Attach a binary multipart part.
    #[must_use]
    pub fn with_binary(mut self, field: impl Into<String>, bytes: Bytes) -> Self {
        self.body = Some(BinaryPart {
            field: field.into(),
            bytes,
        });
        self
    }

    /// Look up the first value of a parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body.
    pub body: Bytes,
}

impl ApiResponse {
    /// Create a response without headers.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body as lossy UTF-8, for error messages.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Rate-limit values reported by the server, if present.
    #[must_use]
    pub fn rate_limit(&self) -> Option<RateLimitStatus> {
        RateLimitStatus::from_headers(&self.headers)
    }
}

/// Server-reported rate-limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Requests allowed in the window.
    pub limit: u32,
    /// Requests left in the window.
    pub remaining: u32,
    /// When the window resets.
    pub reset_at: DateTime<Utc>,
}

impl RateLimitStatus {
    /// Parse `x-rate-limit-*` headers. Returns `None` unless all three are present
    /// and well-formed.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers.get(name)?.to_str().ok()?.trim().parse().ok()
        }

        let limit = header(headers, "x-rate-limit-limit")?;
        let remaining = header(headers, "x-rate-limit-remaining")?;
        let reset: i64 = header(headers, "x-rate-limit-reset")?;
        let reset_at = Utc.timestamp_opt(reset, 0).single()?;

        Some(Self {
            limit,
            remaining,
            reset_at,
        })
    }
}
