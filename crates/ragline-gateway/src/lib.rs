// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP front door for the retrieval chain.
//!
//! Accepts `{question, session_id}` JSON, runs one chain turn for that
//! session and streams the answer back as plain text or Server-Sent Events.
//! No authentication or rate limiting.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{GatewayState, ResponseFormat, ServerConfig, build_router, start_server};
