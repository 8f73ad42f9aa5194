// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session memory and the history-aware retrieval chain.
//!
//! [`SessionStore`] maps session identifiers to conversation histories;
//! [`ConversationalRetrievalChain`] runs rephrase, retrieve, prompt and
//! generate against a provider and a vector index, reading and appending the
//! session's history.

pub mod chain;
pub mod prompt;
pub mod session;

pub use chain::{
    AnswerStream, ChainSettings, ConversationalRetrievalChain, PreparedTurn, TurnOutput,
};
pub use session::{ConversationHistory, SessionStore, SharedHistory};
