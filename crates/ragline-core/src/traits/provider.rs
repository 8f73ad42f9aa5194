// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language model collaborator trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::RaglineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse, ProviderStreamChunk};

/// A finite, non-restartable sequence of response increments.
///
/// Exhaustion signals completion; an `Err` item signals error termination and
/// is the last item a well-behaved stream yields.
pub type TokenStream =
    Pin<Box<dyn Stream<Item = Result<ProviderStreamChunk, RaglineError>> + Send>>;

/// Adapter for chat-style language models.
///
/// Supports both single-shot completion and streaming responses.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends the messages and returns the full response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, RaglineError>;

    /// Sends the messages and returns the response as a token stream.
    async fn stream(&self, request: ProviderRequest) -> Result<TokenStream, RaglineError>;
}
