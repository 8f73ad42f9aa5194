// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat-completion and embedding endpoints.
//!
//! Provides [`OpenAiClient`] which handles bearer authentication, SSE
//! streaming, and optional retry of transient failures.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use ragline_core::RaglineError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::sse;
use crate::types::{
    ApiErrorResponse, ChatChunk, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse,
};

/// HTTP client for OpenAI-compatible APIs.
///
/// Retries are off unless `max_retries` is raised; a retried completion
/// costs a second upstream call.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAiClient {
    /// Creates a client for `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, RaglineError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| RaglineError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RaglineError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            max_retries: 0,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Sets how many times a transient failure (429, 500, 502, 503) is retried.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the pause between retry attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a buffered chat-completion request.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, RaglineError> {
        let mut req = request.clone();
        req.stream = false;
        let response = self.post_with_retry("/chat/completions", &req).await?;
        read_json(response).await
    }

    /// Sends a streaming chat-completion request and returns its chunks.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<ChatChunk, RaglineError>> + Send>>, RaglineError>
    {
        let mut req = request.clone();
        req.stream = true;
        let response = self.post_with_retry("/chat/completions", &req).await?;
        Ok(sse::parse_sse_stream(response))
    }

    /// Sends an embeddings request.
    pub async fn embeddings(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, RaglineError> {
        let response = self.post_with_retry("/embeddings", request).await?;
        read_json(response).await
    }

    async fn post_with_retry<T: Serialize>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<reqwest::Response, RaglineError> {
        let url = format!("{}{endpoint}", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, endpoint, "retrying request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;

            let status = response.status();
            debug!(status = %status, attempt, endpoint, "response received");

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            let error_msg = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                format!("API error ({status}): {}", api_err.error)
            } else {
                format!("API returned {status}: {body}")
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(RaglineError::provider(error_msg));
                continue;
            }

            return Err(RaglineError::provider(error_msg));
        }

        Err(last_error
            .unwrap_or_else(|| RaglineError::provider("request failed after retries")))
    }

    fn transport_error(&self, e: reqwest::Error) -> RaglineError {
        if e.is_timeout() {
            RaglineError::Timeout {
                duration: self.timeout,
            }
        } else {
            RaglineError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RaglineError> {
    let body = response.text().await.map_err(|e| RaglineError::Provider {
        message: format!("failed to read response body: {e}"),
        source: Some(Box::new(e)),
    })?;
    serde_json::from_str(&body).map_err(|e| RaglineError::Provider {
        message: format!("failed to parse API response: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}
