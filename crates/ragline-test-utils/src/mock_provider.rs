// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted responses and
//! records every request it receives.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use ragline_core::RaglineError;
use ragline_core::traits::{PluginAdapter, ProviderAdapter, TokenStream};
use ragline_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, ProviderStreamChunk, TokenUsage,
};

/// Text returned when the script is exhausted.
pub const DEFAULT_RESPONSE: &str = "mock response";

/// One scripted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    /// Succeeds with this text.
    Text(String),
    /// Fails before producing anything.
    Failure(String),
    /// Streams the first `after` tokens of `text`, then fails.
    /// Buffered calls fail outright.
    BrokenStream { text: String, after: usize },
}

/// A mock LLM provider that returns scripted responses.
///
/// Responses are popped from a FIFO queue shared by `complete` and `stream`.
/// When the queue is empty, [`DEFAULT_RESPONSE`] is returned.
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
    latency: Option<Duration>,
}

impl MockProvider {
    /// Create a new mock provider with an empty script.
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    /// Create a mock provider pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self::scripted(responses.into_iter().map(Scripted::Text).collect())
    }

    /// Create a mock provider pre-loaded with arbitrary replies.
    pub fn scripted(replies: Vec<Scripted>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::new(Mutex::new(Vec::new())),
            latency: None,
        }
    }

    /// Sleep this long before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add a successful response to the end of the script.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.push(Scripted::Text(text.into())).await;
    }

    /// Add a failing call to the end of the script.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.push(Scripted::Failure(message.into())).await;
    }

    pub async fn push(&self, reply: Scripted) {
        self.script.lock().await.push_back(reply);
    }

    /// Every request received so far, in arrival order.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    async fn next_reply(&self, request: ProviderRequest) -> Scripted {
        self.requests.lock().await.push(request);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Scripted::Text(DEFAULT_RESPONSE.to_string()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits `text` into word tokens that keep their trailing whitespace, so the
/// tokens concatenate back to `text`.
pub fn word_tokens(text: &str) -> Vec<String> {
    text.split_inclusive(char::is_whitespace)
        .map(str::to_string)
        .collect()
}

fn usage() -> TokenUsage {
    TokenUsage {
        input_tokens: 10,
        output_tokens: 20,
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, RaglineError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, RaglineError> {
        let model = request.model.clone().unwrap_or_else(|| "mock-model".into());
        match self.next_reply(request).await {
            Scripted::Text(text) => Ok(ProviderResponse {
                id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
                content: text,
                model,
                finish_reason: Some("stop".to_string()),
                usage: Some(usage()),
            }),
            Scripted::Failure(message) => Err(RaglineError::provider(message)),
            Scripted::BrokenStream { .. } => Err(RaglineError::provider("stream interrupted")),
        }
    }

    async fn stream(&self, request: ProviderRequest) -> Result<TokenStream, RaglineError> {
        let (tokens, failure) = match self.next_reply(request).await {
            Scripted::Text(text) => (word_tokens(&text), None),
            Scripted::Failure(message) => return Err(RaglineError::provider(message)),
            Scripted::BrokenStream { text, after } => {
                let mut tokens = word_tokens(&text);
                tokens.truncate(after);
                (tokens, Some("stream interrupted"))
            }
        };

        let mut chunks: Vec<Result<ProviderStreamChunk, RaglineError>> = tokens
            .into_iter()
            .map(|t| Ok(ProviderStreamChunk::text(t)))
            .collect();
        match failure {
            Some(message) => chunks.push(Err(RaglineError::provider(message))),
            None => chunks.push(Ok(ProviderStreamChunk {
                text: None,
                finish_reason: Some("stop".to_string()),
                usage: Some(usage()),
            })),
        }

        Ok(Box::pin(stream::iter(chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use ragline_core::types::Message;

    fn request() -> ProviderRequest {
        ProviderRequest::new(vec![Message::human("hi")])
    }

    #[tokio::test]
    async fn default_response_when_script_empty() {
        let provider = MockProvider::new();
        let resp = provider.complete(request()).await.unwrap();
        assert_eq!(resp.content, DEFAULT_RESPONSE);
    }

    #[tokio::test]
    async fn scripted_responses_returned_in_order() {
        let provider = MockProvider::with_responses(vec!["first".into(), "second".into()]);
        assert_eq!(provider.complete(request()).await.unwrap().content, "first");
        assert_eq!(provider.complete(request()).await.unwrap().content, "second");
        assert_eq!(provider.complete(request()).await.unwrap().content, DEFAULT_RESPONSE);
        assert_eq!(provider.request_count().await, 3);
    }

    #[tokio::test]
    async fn stream_tokens_concatenate_to_response() {
        let provider = MockProvider::with_responses(vec!["It is  Paris.\nYes".into()]);
        let chunks: Vec<_> = provider.stream(request()).await.unwrap().collect().await;
        let text: String = chunks
            .iter()
            .filter_map(|c| c.as_ref().unwrap().text.clone())
            .collect();
        assert_eq!(text, "It is  Paris.\nYes");
        assert!(chunks.len() > 2);
    }

    #[tokio::test]
    async fn failure_is_provider_error() {
        let provider = MockProvider::new();
        provider.add_failure("boom").await;
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, RaglineError::Provider { .. }));
    }

    #[tokio::test]
    async fn broken_stream_errors_after_tokens() {
        let provider = MockProvider::scripted(vec![Scripted::BrokenStream {
            text: "one two three".into(),
            after: 2,
        }]);
        let chunks: Vec<_> = provider.stream(request()).await.unwrap().collect().await;
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].is_ok() && chunks[1].is_ok());
        assert!(chunks[2].is_err());
    }

    #[test]
    fn word_tokens_preserve_whitespace() {
        assert_eq!(word_tokens("a b\n c"), ["a ", "b\n", " ", "c"]);
        assert!(word_tokens("").is_empty());
    }
}
