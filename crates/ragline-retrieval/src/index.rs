// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory vector index with exhaustive cosine-similarity search.

use std::sync::Arc;

use async_trait::async_trait;
use ragline_core::error::RaglineError;
use ragline_core::traits::{EmbeddingAdapter, PluginAdapter, VectorIndexAdapter};
use ragline_core::types::{
    AdapterType, Chunk, EmbeddingInput, HealthStatus, ScoredChunk, cosine_similarity,
};
use tokio::sync::RwLock;
use tracing::debug;

/// Texts sent to the embedder per request while indexing.
const EMBED_BATCH_SIZE: usize = 64;

struct IndexedChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Stores chunk vectors in insertion order and ranks all of them per query.
pub struct InMemoryVectorIndex {
    embedder: Arc<dyn EmbeddingAdapter>,
    entries: RwLock<Vec<IndexedChunk>>,
    batch_size: usize,
}

impl InMemoryVectorIndex {
    pub fn new(embedder: Arc<dyn EmbeddingAdapter>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
            batch_size: EMBED_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Vector length of the stored entries, if any are stored.
    pub async fn dimensions(&self) -> Option<usize> {
        self.entries.read().await.first().map(|e| e.vector.len())
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, RaglineError> {
        let expected = texts.len();
        let output = self.embedder.embed(EmbeddingInput { texts }).await?;
        if output.embeddings.len() != expected {
            return Err(RaglineError::embedding(format!(
                "expected {expected} embeddings, got {}",
                output.embeddings.len()
            )));
        }
        Ok(output.embeddings)
    }
}

#[async_trait]
impl PluginAdapter for InMemoryVectorIndex {
    fn name(&self) -> &str {
        "memory"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::VectorIndex
    }

    async fn health_check(&self) -> Result<HealthStatus, RaglineError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl VectorIndexAdapter for InMemoryVectorIndex {
    async fn add(&self, chunks: Vec<Chunk>) -> Result<(), RaglineError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut indexed = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embed_batch(texts).await?;
            indexed.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(vectors)
                    .map(|(chunk, vector)| IndexedChunk { chunk, vector }),
            );
        }

        let mut entries = self.entries.write().await;
        let expected = entries
            .first()
            .or_else(|| indexed.first())
            .map(|e| e.vector.len())
            .unwrap_or(0);
        if let Some(bad) = indexed.iter().find(|e| e.vector.len() != expected) {
            return Err(RaglineError::Index {
                message: format!(
                    "embedding dimension {} does not match index dimension {expected}",
                    bad.vector.len()
                ),
            });
        }

        debug!(added = indexed.len(), total = entries.len() + indexed.len(), "chunks indexed");
        entries.extend(indexed);
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, RaglineError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_one(query).await?;
        let entries = self.entries.read().await;

        if let Some(first) = entries.first()
            && first.vector.len() != query_vector.len()
        {
            return Err(RaglineError::Index {
                message: format!(
                    "query dimension {} does not match index dimension {}",
                    query_vector.len(),
                    first.vector.len()
                ),
            });
        }

        let mut scored: Vec<ScoredChunk> = entries
            .iter()
            .map(|e| ScoredChunk {
                chunk: e.chunk.clone(),
                score: cosine_similarity(&query_vector, &e.vector),
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        if scored.len() < k {
            debug!(requested = k, available = scored.len(), "fewer chunks than requested");
        }
        scored.truncate(k);
        Ok(scored)
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
