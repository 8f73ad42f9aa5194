// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter over the `/embeddings` endpoint.

use async_trait::async_trait;
use ragline_config::model::OpenAiConfig;
use ragline_core::error::RaglineError;
use ragline_core::traits::{EmbeddingAdapter, PluginAdapter};
use ragline_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::EmbeddingRequest;

/// Remote embedding model implementing [`EmbeddingAdapter`].
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates an embedder from the `[openai]` config section.
    pub fn new(config: &OpenAiConfig) -> Result<Self, RaglineError> {
        let client = crate::build_client(config)?;
        info!(model = %config.embedding_model, "embedding adapter initialized");
        Ok(Self::with_client(client, config.embedding_model.clone()))
    }

    pub fn with_client(client: OpenAiClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai-embeddings"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, RaglineError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RaglineError> {
        if input.texts.is_empty() {
            return Ok(EmbeddingOutput {
                embeddings: Vec::new(),
                dimensions: 0,
            });
        }

        let expected = input.texts.len();
        debug!(texts = expected, model = %self.model, "requesting embeddings");
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: input.texts,
        };

        let mut response = self
            .client
            .embeddings(&request)
            .await
            .map_err(into_embedding_error)?;

        if response.data.len() != expected {
            return Err(RaglineError::embedding(format!(
                "expected {expected} embeddings, got {}",
                response.data.len()
            )));
        }

        // The API does not promise response order matches input order.
        response.data.sort_by_key(|d| d.index);
        let embeddings: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);

        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

fn into_embedding_error(err: RaglineError) -> RaglineError {
    match err {
        RaglineError::Provider { message, source } => RaglineError::Embedding { message, source },
        other => other,
    }
}
