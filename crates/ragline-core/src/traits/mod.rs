// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Every external collaborator (language model, embedding model, vector
//! index) extends the [`PluginAdapter`] base trait and uses `#[async_trait]`
//! so it can be held as `Arc<dyn ...>`.

pub mod adapter;
pub mod embedding;
pub mod index;
pub mod loader;
pub mod provider;

pub use adapter::PluginAdapter;
pub use embedding::EmbeddingAdapter;
pub use index::VectorIndexAdapter;
pub use loader::DocumentLoader;
pub use provider::{ProviderAdapter, TokenStream};
