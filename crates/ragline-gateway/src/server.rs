// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    routing::{get, post},
};
use ragline_chain::ConversationalRetrievalChain;
use ragline_config::model::GatewayConfig;
use ragline_core::RaglineError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// How answer tokens are written to the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Raw tokens, `text/plain; charset=utf-8`.
    PlainText,
    /// `token` / `done` / `error` Server-Sent Events.
    EventStream,
}

impl ResponseFormat {
    /// Maps a configured content type; anything but `text/event-stream` is plain.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.trim().eq_ignore_ascii_case("text/event-stream") {
            Self::EventStream
        } else {
            Self::PlainText
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub chain: Arc<ConversationalRetrievalChain>,
    /// Format used when the client does not ask for SSE.
    pub default_format: ResponseFormat,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(chain: Arc<ConversationalRetrievalChain>, default_format: ResponseFormat) -> Self {
        Self {
            chain,
            default_format,
            start_time: Instant::now(),
        }
    }
}

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Builds the gateway router:
/// - POST / and POST /v1/chat: one chat turn, streamed
/// - GET /health
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", post(handlers::post_chat))
        .route("/v1/chat", post(handlers::post_chat))
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds to the configured host:port and serves until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), RaglineError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RaglineError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RaglineError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_format_from_content_type() {
        assert_eq!(
            ResponseFormat::from_content_type("text/event-stream"),
            ResponseFormat::EventStream
        );
        assert_eq!(
            ResponseFormat::from_content_type("Text/Event-Stream "),
            ResponseFormat::EventStream
        );
        assert_eq!(
            ResponseFormat::from_content_type("text/plain"),
            ResponseFormat::PlainText
        );
    }

    #[test]
    fn server_config_from_gateway_config() {
        let config = ServerConfig::from(&GatewayConfig::default());
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(format!("{config:?}").contains("127.0.0.1"));
    }
}
