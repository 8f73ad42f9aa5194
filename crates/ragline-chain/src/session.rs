// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session memory: one conversation history per session identifier.
//!
//! Histories are created on first reference and live for the life of the
//! store. Each sits behind its own async mutex so a turn can hold it from the
//! history read through the final append.

use std::sync::Arc;

use dashmap::DashMap;
use ragline_core::types::{Message, Role, SessionId};
use tokio::sync::Mutex;
use tracing::debug;

/// Shared handle to one session's history.
pub type SharedHistory = Arc<Mutex<ConversationHistory>>;

/// Ordered, append-only message sequence for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    max_messages: Option<usize>,
}

impl ConversationHistory {
    /// Unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `max_messages`, dropping the oldest first.
    ///
    /// Trimming never leaves an assistant reply at the front without the
    /// question it answered, so an odd limit keeps one message fewer.
    pub fn bounded(max_messages: Option<usize>) -> Self {
        Self {
            messages: Vec::new(),
            max_messages,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        if let Some(max) = self.max_messages
            && self.messages.len() > max
        {
            let mut excess = self.messages.len() - max;
            while self
                .messages
                .get(excess)
                .is_some_and(|m| m.role == Role::Assistant)
            {
                excess += 1;
            }
            self.messages.drain(..excess);
        }
    }

    /// Appends a completed question/answer turn.
    pub fn push_turn(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.push(Message::human(question));
        self.push(Message::assistant(answer));
    }
}

/// Process-wide map from session identifier to history.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, SharedHistory>,
    max_history_messages: Option<usize>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose histories keep at most `max` messages each.
    pub fn with_max_history(max: Option<usize>) -> Self {
        Self {
            sessions: DashMap::new(),
            max_history_messages: max,
        }
    }

    /// Returns the history for `session_id`, registering an empty one first
    /// if the identifier is new. Repeated calls return the same handle.
    pub fn get_or_create(&self, session_id: &SessionId) -> SharedHistory {
        if let Some(existing) = self.sessions.get(session_id) {
            return Arc::clone(existing.value());
        }
        let entry = self.sessions.entry(session_id.clone()).or_insert_with(|| {
            debug!(session_id = %session_id, "session created");
            Arc::new(Mutex::new(ConversationHistory::bounded(
                self.max_history_messages,
            )))
        });
        Arc::clone(entry.value())
    }

    /// Returns the history for `session_id` without creating one.
    pub fn get(&self, session_id: &SessionId) -> Option<SharedHistory> {
        self.sessions.get(session_id).map(|e| Arc::clone(e.value()))
    }

    /// Appends `message` to the end of the session's history.
    pub async fn append(&self, session_id: &SessionId, message: Message) {
        let history = self.get_or_create(session_id);
        history.lock().await.push(message);
    }

    /// Copy of the session's messages; empty for unknown sessions.
    pub async fn snapshot(&self, session_id: &SessionId) -> Vec<Message> {
        match self.get(session_id) {
            Some(history) => history.lock().await.messages().to_vec(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
