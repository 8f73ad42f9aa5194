// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector index collaborator trait.

use async_trait::async_trait;

use crate::error::RaglineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Chunk, ScoredChunk};

/// Stores chunk vectors and answers nearest-neighbour queries.
#[async_trait]
pub trait VectorIndexAdapter: PluginAdapter {
    /// Embeds and stores the chunks. Insertion order is preserved.
    async fn add(&self, chunks: Vec<Chunk>) -> Result<(), RaglineError>;

    /// Returns up to `k` chunks ranked by descending similarity to `query`.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, RaglineError>;

    /// Number of stored chunks.
    async fn len(&self) -> usize;
}
