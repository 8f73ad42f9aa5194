// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for ragline integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Scripted LLM provider that records its requests
//! - [`StubEmbedder`] - Deterministic embedder with pinnable vectors
//! - [`TestHarness`] - Chain, index and router wired to the mocks

pub mod harness;
pub mod mock_provider;
pub mod stub_embedder;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_provider::{DEFAULT_RESPONSE, MockProvider, Scripted, word_tokens};
pub use stub_embedder::{STUB_DIMENSIONS, StubEmbedder};
