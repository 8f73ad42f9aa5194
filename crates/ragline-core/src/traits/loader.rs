// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document source trait.

use async_trait::async_trait;

use crate::error::RaglineError;
use crate::types::Chunk;

/// Produces raw, unsplit documents. Each returned chunk is one whole document.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self) -> Result<Vec<Chunk>, RaglineError>;
}
