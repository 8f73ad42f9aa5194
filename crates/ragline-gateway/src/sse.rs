// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events rendering of an answer stream.
//!
//! SSE event format:
//! ```text
//! event: token
//! data: {"text":"partial answer "}
//!
//! event: done
//! data: {"session_id":"..."}
//! ```
//!
//! A failure after the stream has started is reported as a final
//! `event: error` with `{"error": "..."}`; no `done` follows it.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use ragline_chain::AnswerStream;
use ragline_core::types::SessionId;
use tracing::warn;

/// Wraps `tokens` as an SSE response body.
pub fn answer_events(
    tokens: AnswerStream,
    session_id: SessionId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(event_stream(tokens, session_id)).keep_alive(KeepAlive::default())
}

/// One `token` event per chunk, then `done`, or `error` on failure.
pub fn event_stream(
    tokens: AnswerStream,
    session_id: SessionId,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(Some(tokens), move |state| {
        let session_id = session_id.clone();
        async move {
            let mut tokens = state?;
            let event = match tokens.next().await {
                Some(Ok(text)) => {
                    let event = Event::default()
                        .event("token")
                        .data(serde_json::json!({ "text": text }).to_string());
                    return Some((event, Some(tokens)));
                }
                Some(Err(e)) => {
                    warn!(
                        session_id = %session_id,
                        error = %e,
                        "answer stream failed mid-response"
                    );
                    Event::default()
                        .event("error")
                        .data(serde_json::json!({ "error": e.to_string() }).to_string())
                }
                None => Event::default()
                    .event("done")
                    .data(serde_json::json!({ "session_id": session_id.as_str() }).to_string()),
            };
            Some((event, None))
        }
    })
    .map(Ok)
}
