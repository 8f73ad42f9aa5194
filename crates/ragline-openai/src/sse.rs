// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for streamed chat completions.
//!
//! Chat-completion streams carry unnamed `data:` events, each holding one
//! [`ChatChunk`], terminated by a literal `[DONE]` payload.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{self, Stream, StreamExt};
use ragline_core::RaglineError;

use crate::types::{ApiErrorResponse, ChatChunk};

/// Payload that marks the end of a chat-completion stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Parses a streaming response into a stream of [`ChatChunk`]s.
///
/// The stream ends at `[DONE]`. An `{"error": ...}` payload becomes a
/// provider error; empty keep-alive events are skipped.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<ChatChunk, RaglineError>> + Send>> {
    parse_event_stream(response.bytes_stream())
}

/// Parses any byte stream carrying chat-completion SSE events.
pub fn parse_event_stream<S, B, E>(
    bytes: S,
) -> Pin<Box<dyn Stream<Item = Result<ChatChunk, RaglineError>> + Send>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let events = bytes.eventsource();

    let mapped = events
        .take_while(|result| {
            let done = matches!(result, Ok(event) if event.data.trim() == DONE_SENTINEL);
            futures::future::ready(!done)
        })
        .filter_map(|result| async move {
            match result {
                Ok(event) => {
                    let data = event.data.trim();
                    if data.is_empty() {
                        return None;
                    }
                    Some(parse_chunk(data))
                }
                Err(e) => Some(Err(RaglineError::provider(format!("SSE stream error: {e}")))),
            }
        });

    Box::pin(mapped)
}

fn parse_chunk(data: &str) -> Result<ChatChunk, RaglineError> {
    match serde_json::from_str::<ChatChunk>(data) {
        Ok(chunk) if !chunk.choices.is_empty() || chunk.usage.is_some() => Ok(chunk),
        parsed => {
            if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(data) {
                return Err(RaglineError::provider(format!(
                    "stream error from API: {}",
                    api_err.error
                )));
            }
            parsed.map_err(|e| RaglineError::Provider {
                message: format!("failed to parse stream chunk: {e}"),
                source: Some(Box::new(e)),
            })
        }
    }
}

/// Convenience for tests and callers that already hold the raw SSE text.
pub fn parse_sse_text(
    text: &str,
) -> Pin<Box<dyn Stream<Item = Result<ChatChunk, RaglineError>> + Send>> {
    let body = text.as_bytes().to_vec();
    parse_event_stream(stream::iter([Ok::<_, std::io::Error>(body)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sse(payloads: &[&str]) -> String {
        payloads
            .iter()
            .map(|p| format!("data: {p}\n\n"))
            .collect::<String>()
    }

    #[tokio::test]
    async fn yields_chunks_until_done() {
        let body = sse(&[
            r#"{"id":"c","model":"m","choices":[{"index":0,"delta":{"role":"assistant"}}]}"#,
            r#"{"id":"c","model":"m","choices":[{"index":0,"delta":{"content":"Hel"}}]}"#,
            r#"{"id":"c","model":"m","choices":[{"index":0,"delta":{"content":"lo"}}]}"#,
            r#"{"id":"c","model":"m","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
            "[DONE]",
            r#"{"id":"c","model":"m","choices":[{"index":0,"delta":{"content":"ignored"}}]}"#,
        ]);

        let chunks: Vec<_> = parse_sse_text(&body).collect().await;
        assert_eq!(chunks.len(), 4);
        let text: String = chunks
            .iter()
            .filter_map(|c| c.as_ref().ok())
            .filter_map(|c| c.choices[0].delta.content.clone())
            .collect();
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn error_payload_becomes_provider_error() {
        let body = sse(&[r#"{"error":{"message":"overloaded","type":"server_error"}}"#]);
        let chunks: Vec<_> = parse_sse_text(&body).collect().await;
        assert_eq!(chunks.len(), 1);
        let err = chunks[0].as_ref().unwrap_err();
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn malformed_payload_is_an_error() {
        let body = sse(&["not json"]);
        let chunks: Vec<_> = parse_sse_text(&body).collect().await;
        assert!(matches!(chunks[0], Err(RaglineError::Provider { .. })));
    }

    #[tokio::test]
    async fn stream_without_done_ends_with_body() {
        let body = sse(&[r#"{"choices":[{"index":0,"delta":{"content":"x"}}]}"#]);
        let chunks: Vec<_> = parse_sse_text(&body).collect().await;
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_ok());
    }
}
