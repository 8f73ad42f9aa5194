// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for ragline.
//!
//! Holds the error type, the conversation and retrieval types, and the
//! collaborator traits (language model, embedding model, vector index,
//! document source) that the rest of the workspace is written against.

pub mod error;
pub mod traits;
pub mod types;

pub use error::RaglineError;
pub use types::{
    AdapterType, Chunk, HealthStatus, Message, Role, ScoredChunk, SessionId, cosine_similarity,
};

pub use traits::{
    DocumentLoader, EmbeddingAdapter, PluginAdapter, ProviderAdapter, TokenStream,
    VectorIndexAdapter,
};
