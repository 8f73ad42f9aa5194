// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible adapters for ragline.
//!
//! [`OpenAiProvider`] implements [`ProviderAdapter`] over the chat-completions
//! endpoint (buffered and SSE streaming); [`OpenAiEmbedder`] implements
//! [`EmbeddingAdapter`](ragline_core::EmbeddingAdapter) over `/embeddings`.

pub mod client;
pub mod embedder;
pub mod sse;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use ragline_config::model::OpenAiConfig;
use ragline_core::error::RaglineError;
use ragline_core::traits::{PluginAdapter, ProviderAdapter, TokenStream};
use ragline_core::types::{
    AdapterType, HealthStatus, Message, ProviderRequest, ProviderResponse, ProviderStreamChunk,
    Role, TokenUsage,
};
use tracing::{debug, info};

pub use crate::client::OpenAiClient;
pub use crate::embedder::OpenAiEmbedder;

use crate::types::{ApiMessage, ApiUsage, ChatChunk, ChatRequest};

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Chat model behind [`ProviderAdapter`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    model: String,
}

impl OpenAiProvider {
    /// Creates a provider from the `[openai]` config section.
    pub fn new(config: &OpenAiConfig) -> Result<Self, RaglineError> {
        let client = build_client(config)?;
        info!(
            model = %config.chat_model,
            base_url = %client.base_url(),
            "chat provider initialized"
        );
        Ok(Self::with_client(client, config.chat_model.clone()))
    }

    pub fn with_client(client: OpenAiClient, model: String) -> Self {
        Self { client, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_chat_request(&self, request: &ProviderRequest, stream: bool) -> ChatRequest {
        ChatRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: request.messages.iter().map(to_api_message).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, RaglineError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, RaglineError> {
        let chat_request = self.to_chat_request(&request, false);
        debug!(
            model = %chat_request.model,
            messages = chat_request.messages.len(),
            "sending completion"
        );

        let response = self.client.chat(&chat_request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RaglineError::provider("completion returned no choices"))?;

        Ok(ProviderResponse {
            id: response.id,
            content: choice.message.content.unwrap_or_default(),
            model: response.model,
            finish_reason: choice.finish_reason,
            usage: response.usage.map(to_token_usage),
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<TokenStream, RaglineError> {
        let chat_request = self.to_chat_request(&request, true);
        debug!(
            model = %chat_request.model,
            messages = chat_request.messages.len(),
            "opening completion stream"
        );

        let events = self.client.chat_stream(&chat_request).await?;
        let chunks = events.filter_map(|event| async move {
            match event {
                Ok(chunk) => map_chat_chunk(chunk).map(Ok),
                Err(e) => Some(Err(e)),
            }
        });
        Ok(Box::pin(chunks))
    }
}

/// Maps one streamed chunk to a [`ProviderStreamChunk`].
///
/// Role-only deltas carry nothing for the caller and return `None`.
fn map_chat_chunk(chunk: ChatChunk) -> Option<ProviderStreamChunk> {
    let usage = chunk.usage.map(to_token_usage);
    let choice = chunk.choices.into_iter().next();
    let (text, finish_reason) = match choice {
        Some(choice) => (
            choice.delta.content.filter(|t| !t.is_empty()),
            choice.finish_reason,
        ),
        None => (None, None),
    };

    if text.is_none() && finish_reason.is_none() && usage.is_none() {
        return None;
    }
    Some(ProviderStreamChunk {
        text,
        finish_reason,
        usage,
    })
}

fn to_api_message(message: &Message) -> ApiMessage {
    let role = match message.role {
        Role::System => "system",
        Role::Human => "user",
        Role::Assistant => "assistant",
    };
    ApiMessage {
        role: role.to_string(),
        content: Some(message.content.clone()),
    }
}

fn to_token_usage(usage: ApiUsage) -> TokenUsage {
    TokenUsage {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
    }
}

pub(crate) fn build_client(config: &OpenAiConfig) -> Result<OpenAiClient, RaglineError> {
    let api_key = resolve_api_key(&config.api_key)?;
    Ok(OpenAiClient::new(
        &api_key,
        &config.base_url,
        Duration::from_secs(config.timeout_secs),
    )?
    .with_max_retries(config.max_retries))
}

/// Resolves the API key from config or environment.
pub fn resolve_api_key(config_key: &Option<String>) -> Result<String, RaglineError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(RaglineError::Config(
            "OpenAI API key not found. Set openai.api_key in config or \
             OPENAI_API_KEY environment variable."
                .into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkChoice, ChunkDelta};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_provider(base_url: &str) -> OpenAiProvider {
        let client = OpenAiClient::new("test-key", base_url, Duration::from_secs(5)).unwrap();
        OpenAiProvider::with_client(client, "gpt-test".into())
    }

    fn delta_chunk(content: Option<&str>, finish: Option<&str>) -> ChatChunk {
        ChatChunk {
            id: "c".into(),
            model: "gpt-test".into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: content.map(str::to_string),
                },
                finish_reason: finish.map(str::to_string),
            }],
            usage: None,
        }
    }

    #[test]
    fn resolve_api_key_from_config() {
        let result = resolve_api_key(&Some("sk-test-123".into()));
        assert_eq!(result.unwrap(), "sk-test-123");
    }

    #[test]
    fn resolve_api_key_none_falls_back_to_env() {
        let result = resolve_api_key(&None);
        // Succeeds only when OPENAI_API_KEY is set in the test environment.
        match result {
            Ok(key) => assert!(!key.is_empty()),
            Err(e) => assert!(e.to_string().contains("API key not found"), "got: {e}"),
        }
    }

    #[test]
    fn roles_map_to_api_names() {
        let provider = test_provider("http://localhost:1");
        let request = ProviderRequest::new(vec![
            Message::system("sys"),
            Message::human("q"),
            Message::assistant("a"),
        ])
        .with_temperature(Some(0.1));

        let api = provider.to_chat_request(&request, false);
        let roles: Vec<_> = api.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant"]);
        assert_eq!(api.model, "gpt-test");
        assert_eq!(api.temperature, Some(0.1));
    }

    #[test]
    fn request_model_overrides_default() {
        let provider = test_provider("http://localhost:1");
        let mut request = ProviderRequest::new(vec![Message::human("q")]);
        request.model = Some("gpt-other".into());
        assert_eq!(provider.to_chat_request(&request, true).model, "gpt-other");
    }

    #[test]
    fn role_only_delta_is_skipped() {
        let mut chunk = delta_chunk(None, None);
        chunk.choices[0].delta.role = Some("assistant".into());
        assert!(map_chat_chunk(chunk).is_none());
    }

    #[test]
    fn text_delta_maps_to_text_chunk() {
        let mapped = map_chat_chunk(delta_chunk(Some("Hi"), None)).unwrap();
        assert_eq!(mapped.text.as_deref(), Some("Hi"));
        assert!(mapped.finish_reason.is_none());
    }

    #[test]
    fn finish_delta_keeps_reason() {
        let mapped = map_chat_chunk(delta_chunk(None, Some("stop"))).unwrap();
        assert!(mapped.text.is_none());
        assert_eq!(mapped.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn plugin_adapter_metadata() {
        let provider = test_provider("http://localhost:1");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.version(), semver::Version::new(0, 1, 0));
        assert_eq!(provider.adapter_type(), AdapterType::Provider);
    }

    #[tokio::test]
    async fn complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{"role": "user", "content": "Capital of France?"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cmpl-1",
                "model": "gpt-test",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Paris."},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 7, "completion_tokens": 2}
            })))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let response = provider
            .complete(ProviderRequest::new(vec![Message::human("Capital of France?")]))
            .await
            .unwrap();
        assert_eq!(response.content, "Paris.");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(
            response.usage,
            Some(TokenUsage {
                input_tokens: 7,
                output_tokens: 2
            })
        );
    }

    #[tokio::test]
    async fn complete_without_choices_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cmpl-2", "model": "gpt-test", "choices": []
            })))
            .mount(&server)
            .await;

        let err = test_provider(&server.uri())
            .complete(ProviderRequest::new(vec![Message::human("q")]))
            .await
            .unwrap_err();
        assert!(matches!(err, RaglineError::Provider { .. }));
    }

    #[tokio::test]
    async fn stream_yields_text_chunks_in_order() {
        let server = MockServer::start().await;
        let body = [
            r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":""}}]}"#,
            r#"{"id":"s","model":"gpt-test","choices":[{"index":0,"delta":{"content":"It "}}]}"#,
            r#"{"id":"s","model":"gpt-test","choices":[{"index":0,"delta":{"content":"is "}}]}"#,
            r#"{"id":"s","model":"gpt-test","choices":[{"index":0,"delta":{"content":"Paris."}}]}"#,
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
            "[DONE]",
        ]
        .iter()
        .map(|p| format!("data: {p}\n\n"))
        .collect::<String>();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let stream = test_provider(&server.uri())
            .stream(ProviderRequest::new(vec![Message::human("q")]))
            .await
            .unwrap();
        let chunks: Vec<_> = stream.collect().await;
        let text: String = chunks
            .iter()
            .filter_map(|c| c.as_ref().unwrap().text.clone())
            .collect();
        assert_eq!(text, "It is Paris.");
        let last = chunks.last().unwrap().as_ref().unwrap();
        assert_eq!(last.finish_reason.as_deref(), Some("stop"));
    }
}
