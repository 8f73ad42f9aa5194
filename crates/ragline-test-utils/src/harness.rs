// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete chain with a scripted provider, a stub
//! embedder and an in-memory index. It drives turns directly or through the
//! gateway router.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use ragline_chain::{ChainSettings, ConversationalRetrievalChain, SessionStore, TurnOutput};
use ragline_config::RaglineConfig;
use ragline_core::types::{Chunk, Message, SessionId};
use ragline_core::{EmbeddingAdapter, RaglineError};
use ragline_gateway::{GatewayState, ResponseFormat, build_router};
use ragline_retrieval::{InMemoryVectorIndex, build_index};

use crate::mock_provider::{MockProvider, Scripted};
use crate::stub_embedder::StubEmbedder;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<Scripted>,
    documents: Vec<Chunk>,
    embedder: StubEmbedder,
    config: RaglineConfig,
    latency: Option<Duration>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            documents: Vec::new(),
            embedder: StubEmbedder::new(),
            config: RaglineConfig::default(),
            latency: None,
        }
    }

    /// Set mock provider responses, consumed one per model call.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.replies = responses.into_iter().map(Scripted::Text).collect();
        self
    }

    /// Set arbitrary scripted replies, including failures.
    pub fn with_script(mut self, replies: Vec<Scripted>) -> Self {
        self.replies = replies;
        self
    }

    /// Chunks to index before the harness is returned.
    pub fn with_documents<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.documents = texts.into_iter().map(Chunk::new).collect();
        self
    }

    pub fn with_embedder(mut self, embedder: StubEmbedder) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_config(mut self, config: RaglineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.config.retrieval.top_k = top_k;
        self
    }

    /// Make every provider call take at least `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Build the test harness, indexing the configured documents.
    pub async fn build(self) -> Result<TestHarness, RaglineError> {
        let mut provider = MockProvider::scripted(self.replies);
        if let Some(latency) = self.latency {
            provider = provider.with_latency(latency);
        }
        let provider = Arc::new(provider);

        let embedder = Arc::new(self.embedder);
        let index = Arc::new(
            build_index(self.documents, embedder.clone() as Arc<dyn EmbeddingAdapter>).await?,
        );
        let sessions = Arc::new(SessionStore::with_max_history(
            self.config.session.max_history_messages,
        ));

        let chain = Arc::new(ConversationalRetrievalChain::new(
            provider.clone(),
            index.clone(),
            sessions.clone(),
            ChainSettings::from(&self.config),
        ));

        Ok(TestHarness {
            provider,
            embedder,
            index,
            sessions,
            chain,
            config: self.config,
        })
    }
}

/// A complete test environment with mock adapters.
pub struct TestHarness {
    pub provider: Arc<MockProvider>,
    pub embedder: Arc<StubEmbedder>,
    pub index: Arc<InMemoryVectorIndex>,
    pub sessions: Arc<SessionStore>,
    pub chain: Arc<ConversationalRetrievalChain>,
    pub config: RaglineConfig,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Runs one buffered turn.
    pub async fn ask(&self, session_id: &str, question: &str) -> Result<TurnOutput, RaglineError> {
        self.chain.invoke(&SessionId::from(session_id), question).await
    }

    /// Runs one streamed turn and concatenates the tokens.
    pub async fn ask_streaming(
        &self,
        session_id: &str,
        question: &str,
    ) -> Result<String, RaglineError> {
        let mut tokens = self
            .chain
            .stream(&SessionId::from(session_id), question)
            .await?;
        let mut answer = String::new();
        while let Some(token) = tokens.next().await {
            answer.push_str(&token?);
        }
        Ok(answer)
    }

    /// Current history of a session.
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        self.sessions.snapshot(&SessionId::from(session_id)).await
    }

    /// Gateway router wired to this harness's chain.
    pub fn router(&self) -> axum::Router {
        build_router(GatewayState::new(
            self.chain.clone(),
            ResponseFormat::from_content_type(&self.config.gateway.content_type),
        ))
    }
}
