// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding adapter for tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ragline_core::RaglineError;
use ragline_core::traits::{EmbeddingAdapter, PluginAdapter};
use ragline_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};

/// Default vector length of [`StubEmbedder`].
pub const STUB_DIMENSIONS: usize = 8;

/// Embeds text by table lookup, falling back to a character histogram.
///
/// Pinned vectors make rankings exact; the fallback keeps unknown text
/// deterministic. Pinned vectors must have the embedder's dimension.
pub struct StubEmbedder {
    dimensions: usize,
    table: HashMap<String, Vec<f32>>,
    calls: Arc<AtomicUsize>,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self::with_dimensions(STUB_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            table: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Pins the vector returned for `text`.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.table.insert(text.into(), vector);
        self
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vector this embedder produces for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(pinned) = self.table.get(text) {
            return pinned.clone();
        }
        let mut vector = vec![0.0; self.dimensions];
        for c in text.chars().filter(|c| c.is_alphanumeric()) {
            let bucket = c.to_ascii_lowercase() as u32 as usize % self.dimensions;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for StubEmbedder {
    fn name(&self) -> &str {
        "stub-embedder"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, RaglineError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for StubEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RaglineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.vector_for(t)).collect(),
            dimensions: self.dimensions,
        })
    }
}
