//! reqwest-backed [`RequestExecutor`].

#![allow(clippy::missing_errors_doc)]

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder};

use super::config::HttpConfig;
use crate::error::ApiError;
use crate::traits::{ApiRequest, ApiResponse, ByteStream, HttpMethod, RequestExecutor};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP executor shared by upload sessions and stream connections.
///
/// Holds two connection pools: one with a whole-request timeout for buffered
/// calls, and one with only connect and read timeouts for long-lived streams.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    stream_client: Client,
    config: HttpConfig,
}

impl HttpExecutor {
    /// Create a new executor.
    pub fn new(config: HttpConfig) -> Result<Self, ApiError> {
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Transport {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        let stream_client = Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(Duration::from_millis(config.stream_read_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Transport {
                message: format!("Failed to create streaming HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            stream_client,
            config,
        })
    }

    /// Get the executor configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn build(&self, client: &Client, request: ApiRequest) -> Result<RequestBuilder, ApiError> {
        let builder = match request.method {
            HttpMethod::Get => client.get(with_query(&request.url, &request.params)?),
            HttpMethod::Post => {
                let builder = client.post(&request.url);
                match request.body {
                    Some(binary) => {
                        let mut form = Form::new();
                        for (name, value) in request.params {
                            form = form.text(name, value);
                        }
                        let len = binary.bytes.len() as u64;
                        let part = Part::stream_with_length(Body::from(binary.bytes), len)
                            .file_name(binary.field.clone());
                        builder.multipart(form.part(binary.field, part))
                    }
                    None => builder
                        .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                        .body(form_encode(&request.params)),
                }
            }
        };

        Ok(match &self.config.access_token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        })
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = request.method;
        let url = request.url.clone();
        let start = Instant::now();

        tracing::debug!(
            method = %method,
            url = %url,
            params = request.params.len(),
            multipart = request.body.is_some(),
            "Sending request"
        );

        let response = self
            .build(&self.client, request)?
            .send()
            .await
            .map_err(|e| map_send_error(&e, self.config.timeout_ms))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_send_error(&e, self.config.timeout_ms))?;

        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        if (200..300).contains(&status) {
            tracing::debug!(method = %method, url = %url, status, elapsed_ms, "Request completed");
        } else {
            tracing::warn!(method = %method, url = %url, status, elapsed_ms, "Request returned error status");
        }

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    async fn open_stream(&self, request: ApiRequest) -> Result<ByteStream, ApiError> {
        let url = request.url.clone();
        let read_timeout_ms = self.config.stream_read_timeout_ms;

        tracing::debug!(url = %url, params = request.params.len(), "Opening stream");

        let response = self
            .build(&self.stream_client, request)?
            .send()
            .await
            .map_err(|e| map_send_error(&e, self.config.connect_timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Failed to read rejection body");
                    String::new()
                }
            };
            tracing::error!(url = %url, status = status.as_u16(), "Stream rejected");
            return Err(ApiError::Protocol {
                status: status.as_u16(),
                message: body,
            });
        }

        tracing::info!(url = %url, "Stream connected");

        let stream = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout {
                        timeout_ms: read_timeout_ms,
                    }
                } else {
                    ApiError::Transport {
                        message: e.to_string(),
                    }
                }
            })
        });

        Ok(Box::pin(stream))
    }
}

fn map_send_error(error: &reqwest::Error, timeout_ms: u64) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout { timeout_ms }
    } else {
        tracing::debug!(error = %error, connect = error.is_connect(), "HTTP send failed");
        ApiError::Transport {
            message: error.to_string(),
        }
    }
}

fn with_query(base: &str, params: &[(String, String)]) -> Result<url::Url, ApiError> {
    let mut url = url::Url::parse(base).map_err(|e| ApiError::InvalidRequest {
        message: format!("Invalid URL {base}: {e}"),
    })?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

fn form_encode(params: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}
