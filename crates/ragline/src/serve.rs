// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ragline serve` command implementation.
//!
//! Loads and splits the configured documents, embeds them into the
//! in-memory index and serves the chat gateway until Ctrl-C.

use std::sync::Arc;

use ragline_chain::{ChainSettings, ConversationalRetrievalChain, SessionStore};
use ragline_config::RaglineConfig;
use ragline_core::{EmbeddingAdapter, RaglineError};
use ragline_gateway::{GatewayState, ResponseFormat, ServerConfig, start_server};
use ragline_openai::{OpenAiEmbedder, OpenAiProvider};
use ragline_retrieval::{DocumentSources, SplitterConfig, build_index, load_and_split};
use tracing::{error, info, warn};

/// Runs the `ragline serve` command.
pub async fn run_serve(config: RaglineConfig) -> Result<(), RaglineError> {
    info!("starting ragline serve");

    let chain = build_chain(&config).await?;
    let state = GatewayState::new(
        chain,
        ResponseFormat::from_content_type(&config.gateway.content_type),
    );

    start_server(&ServerConfig::from(&config.gateway), state, shutdown_signal()).await?;

    info!("ragline serve shutdown complete");
    Ok(())
}

/// Wires the provider, embedder, document index and session store into a
/// retrieval chain.
///
/// Credentials are resolved first, so a missing API key fails before any
/// document is read or any request is sent.
pub async fn build_chain(
    config: &RaglineConfig,
) -> Result<Arc<ConversationalRetrievalChain>, RaglineError> {
    let provider = Arc::new(OpenAiProvider::new(&config.openai)?);
    let embedder: Arc<dyn EmbeddingAdapter> = Arc::new(OpenAiEmbedder::new(&config.openai)?);

    let loader = DocumentSources::from_config(&config.documents);
    let chunks = load_and_split(&loader, &SplitterConfig::from(&config.documents)).await?;
    if chunks.is_empty() {
        warn!(
            paths = ?config.documents.paths,
            "no document chunks loaded, answers will have no context"
        );
    }
    let index = Arc::new(build_index(chunks, embedder).await?);

    let sessions = Arc::new(SessionStore::with_max_history(
        config.session.max_history_messages,
    ));

    info!(
        model = %config.openai.chat_model,
        top_k = config.retrieval.top_k,
        "retrieval chain ready"
    );

    Ok(Arc::new(ConversationalRetrievalChain::new(
        provider,
        index,
        sessions,
        ChainSettings::from(config),
    )))
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}
