// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document and vector-index collaborators for ragline.
//!
//! - [`FileLoader`] reads plain-text files into whole-document chunks and PDF
//!   files into one chunk per page.
//! - [`RepositoryLoader`] reads a local checkout, honoring `.gitignore`.
//! - [`DocumentSources`] chains every configured loader.
//! - [`RecursiveSplitter`] cuts documents into bounded, overlapping chunks.
//! - [`InMemoryVectorIndex`] embeds chunks and answers top-k cosine queries.

pub mod index;
pub mod loader;
pub mod pdf;
pub mod repository;
pub mod splitter;

use std::sync::Arc;

use async_trait::async_trait;
use ragline_config::model::DocumentsConfig;
use ragline_core::error::RaglineError;
use ragline_core::traits::{DocumentLoader, EmbeddingAdapter, VectorIndexAdapter};
use ragline_core::types::Chunk;
use tracing::info;

pub use index::InMemoryVectorIndex;
pub use loader::FileLoader;
pub use pdf::PdfLoader;
pub use repository::RepositoryLoader;
pub use splitter::{RecursiveSplitter, SplitterConfig};

/// Every configured document source, loaded in order.
pub struct DocumentSources {
    loaders: Vec<Box<dyn DocumentLoader>>,
}

impl DocumentSources {
    pub fn new(loaders: Vec<Box<dyn DocumentLoader>>) -> Self {
        Self { loaders }
    }

    /// The file loader for `paths` followed by one loader per repository.
    pub fn from_config(config: &DocumentsConfig) -> Self {
        let mut loaders: Vec<Box<dyn DocumentLoader>> = Vec::new();
        if !config.paths.is_empty() {
            loaders.push(Box::new(FileLoader::from_config(config)));
        }
        for repository in &config.repositories {
            loaders.push(Box::new(RepositoryLoader::from_config(repository)));
        }
        Self::new(loaders)
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

#[async_trait]
impl DocumentLoader for DocumentSources {
    async fn load(&self) -> Result<Vec<Chunk>, RaglineError> {
        let mut documents = Vec::new();
        for loader in &self.loaders {
            documents.extend(loader.load().await?);
        }
        Ok(documents)
    }
}

/// Loads every document from `loader` and splits it into retrieval chunks.
pub async fn load_and_split(
    loader: &dyn DocumentLoader,
    config: &SplitterConfig,
) -> Result<Vec<Chunk>, RaglineError> {
    let documents = loader.load().await?;
    let chunks = RecursiveSplitter::new(config.clone()).split_chunks(&documents);
    info!(
        documents = documents.len(),
        chunks = chunks.len(),
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        "documents split"
    );
    Ok(chunks)
}

/// Embeds `chunks` into a fresh in-memory index.
pub async fn build_index(
    chunks: Vec<Chunk>,
    embedder: Arc<dyn EmbeddingAdapter>,
) -> Result<InMemoryVectorIndex, RaglineError> {
    let index = InMemoryVectorIndex::new(embedder);
    index.add(chunks).await?;
    info!(chunks = index.len().await, "vector index built");
    Ok(index)
}
