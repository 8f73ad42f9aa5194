// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::RaglineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{EmbeddingInput, EmbeddingOutput};

/// Maps text to fixed-length vectors.
#[async_trait]
pub trait EmbeddingAdapter: PluginAdapter {
    /// Generates one embedding per input text, in input order.
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RaglineError>;

    /// Convenience wrapper embedding a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, RaglineError> {
        let output = self
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RaglineError::embedding("embedding returned no vectors"))
    }
}
