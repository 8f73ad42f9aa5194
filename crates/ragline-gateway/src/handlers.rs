// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! Handles POST / (alias POST /v1/chat) and GET /health.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use ragline_core::RaglineError;
use ragline_core::traits::{PluginAdapter, VectorIndexAdapter};
use ragline_core::types::{HealthStatus, SessionId};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::server::{GatewayState, ResponseFormat};
use crate::sse;

/// Request body for POST /.
///
/// Both fields are required; they are optional here so a missing field
/// gets the same 400 body as a blank one.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A validated chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub question: String,
    pub session_id: SessionId,
}

impl ChatRequest {
    pub fn validate(self) -> Result<ChatTurn, String> {
        let question = self
            .question
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| "missing or empty field: question".to_string())?;
        let session_id = self
            .session_id
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| "missing or empty field: session_id".to_string())?;
        Ok(ChatTurn {
            question,
            session_id: SessionId(session_id),
        })
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub sessions: usize,
    pub chunks: usize,
    pub provider: HealthStatus,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Maps a chain failure that happened before any token was written.
pub fn error_response(err: &RaglineError) -> Response {
    let status = match err {
        RaglineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        e if e.is_upstream() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, status = %status, "chat turn failed");
    }
    error_json(status, err.to_string())
}

fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"))
}

/// POST /
///
/// Runs one chat turn and streams the answer as it is generated. Clients
/// sending `Accept: text/event-stream` get SSE regardless of the configured
/// default.
pub async fn post_chat(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected chat request body");
            return error_json(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };
    let turn = match body.validate() {
        Ok(turn) => turn,
        Err(message) => return error_json(StatusCode::BAD_REQUEST, message),
    };

    let tokens = match state.chain.stream(&turn.session_id, &turn.question).await {
        Ok(tokens) => tokens,
        Err(e) => return error_response(&e),
    };

    let format = if wants_event_stream(&headers) {
        ResponseFormat::EventStream
    } else {
        state.default_format
    };

    match format {
        ResponseFormat::EventStream => {
            sse::answer_events(tokens, turn.session_id).into_response()
        }
        ResponseFormat::PlainText => {
            let session_id = turn.session_id;
            let body = tokens.map(move |item| {
                item.map(Bytes::from).inspect_err(|e| {
                    warn!(
                        session_id = %session_id,
                        error = %e,
                        "answer stream failed mid-response"
                    );
                })
            });
            (
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                Body::from_stream(body),
            )
                .into_response()
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let provider = state
        .chain
        .provider()
        .health_check()
        .await
        .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
    let status = match provider {
        HealthStatus::Healthy => "healthy",
        HealthStatus::Degraded(_) => "degraded",
        HealthStatus::Unhealthy(_) => "unhealthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        sessions: state.chain.sessions().len(),
        chunks: state.chain.index().len().await,
        provider,
    })
}
