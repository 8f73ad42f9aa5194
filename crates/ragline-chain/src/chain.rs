// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History-aware retrieval chain.
//!
//! A turn runs four stages in a fixed order:
//! rephrase -> retrieve -> assemble prompt -> generate. The session's history
//! lock is held for the whole turn, and the question/answer pair is appended
//! only once generation has finished successfully.

use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use ragline_config::RaglineConfig;
use ragline_core::error::RaglineError;
use ragline_core::traits::{ProviderAdapter, TokenStream, VectorIndexAdapter};
use ragline_core::types::{Message, ProviderRequest, ScoredChunk, SessionId};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::prompt;
use crate::session::{ConversationHistory, SessionStore};

/// Answer tokens in generation order. Ends after the last token, or after
/// the first error.
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<String, RaglineError>> + Send>>;

/// Tunables for a [`ConversationalRetrievalChain`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSettings {
    /// Chunks retrieved per question.
    pub top_k: usize,
    pub rephrase_temperature: Option<f32>,
    pub answer_temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self::from(&RaglineConfig::default())
    }
}

impl From<&RaglineConfig> for ChainSettings {
    fn from(config: &RaglineConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            rephrase_temperature: Some(config.openai.rephrase_temperature),
            answer_temperature: config.openai.answer_temperature,
            max_tokens: config.openai.max_tokens,
        }
    }
}

/// Result of a buffered turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutput {
    pub answer: String,
    pub standalone_question: String,
    pub context: Vec<ScoredChunk>,
}

/// Output of the first three stages: everything the answer call needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTurn {
    pub standalone_question: String,
    pub context: Vec<ScoredChunk>,
    pub messages: Vec<Message>,
}

/// Drives history-aware turns over a provider, a vector index and a
/// [`SessionStore`]. Shared across request handlers behind an `Arc`.
pub struct ConversationalRetrievalChain {
    provider: Arc<dyn ProviderAdapter>,
    index: Arc<dyn VectorIndexAdapter>,
    sessions: Arc<SessionStore>,
    settings: ChainSettings,
}

impl ConversationalRetrievalChain {
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        index: Arc<dyn VectorIndexAdapter>,
        sessions: Arc<SessionStore>,
        settings: ChainSettings,
    ) -> Self {
        Self {
            provider,
            index,
            sessions,
            settings,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn index(&self) -> &Arc<dyn VectorIndexAdapter> {
        &self.index
    }

    pub fn provider(&self) -> &Arc<dyn ProviderAdapter> {
        &self.provider
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    /// Stage 1: rewrites `question` so it stands without `history`.
    ///
    /// With no history there is nothing to resolve, so the question is
    /// returned unchanged and the model is not called.
    pub async fn rephrase_question(
        &self,
        history: &[Message],
        question: &str,
    ) -> Result<String, RaglineError> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let request = ProviderRequest::new(prompt::rephrase_messages(history, question))
            .with_temperature(self.settings.rephrase_temperature)
            .with_max_tokens(self.settings.max_tokens);
        let response = self.provider.complete(request).await?;
        let standalone = response.content.trim();

        if standalone.is_empty() {
            warn!("rephrase returned no text, using the original question");
            return Ok(question.to_string());
        }
        Ok(standalone.to_string())
    }

    /// Stage 2: top-k chunks for the standalone question.
    pub async fn retrieve_context(
        &self,
        standalone_question: &str,
    ) -> Result<Vec<ScoredChunk>, RaglineError> {
        let chunks = self
            .index
            .search(standalone_question, self.settings.top_k)
            .await?;
        debug!(requested = self.settings.top_k, retrieved = chunks.len(), "context retrieved");
        Ok(chunks)
    }

    /// Stage 3: the answer-call messages.
    pub fn answer_messages(
        &self,
        context: &[ScoredChunk],
        history: &[Message],
        standalone_question: &str,
    ) -> Vec<Message> {
        prompt::answer_messages(&prompt::format_context(context), history, standalone_question)
    }

    /// Runs stages 1-3 against `history`.
    pub async fn prepare(
        &self,
        history: &[Message],
        question: &str,
    ) -> Result<PreparedTurn, RaglineError> {
        let standalone_question = self.rephrase_question(history, question).await?;
        let context = self.retrieve_context(&standalone_question).await?;
        let messages = self.answer_messages(&context, history, &standalone_question);
        Ok(PreparedTurn {
            standalone_question,
            context,
            messages,
        })
    }

    fn answer_request(&self, messages: Vec<Message>) -> ProviderRequest {
        ProviderRequest::new(messages)
            .with_temperature(self.settings.answer_temperature)
            .with_max_tokens(self.settings.max_tokens)
    }

    /// Runs a full turn and returns the buffered answer.
    pub async fn invoke(
        &self,
        session_id: &SessionId,
        question: &str,
    ) -> Result<TurnOutput, RaglineError> {
        validate_question(question)?;
        let history = self.sessions.get_or_create(session_id);
        let mut history = history.lock().await;

        let prepared = self.prepare(history.messages(), question).await?;
        let response = self
            .provider
            .complete(self.answer_request(prepared.messages))
            .await?;

        history.push_turn(question, response.content.clone());
        info!(
            session_id = %session_id,
            history_len = history.len(),
            answer_len = response.content.len(),
            "turn complete"
        );

        Ok(TurnOutput {
            answer: response.content,
            standalone_question: prepared.standalone_question,
            context: prepared.context,
        })
    }

    /// Runs a full turn and returns the answer as a token stream.
    ///
    /// The session stays locked until the stream ends or is dropped. The turn
    /// is recorded only if the stream runs to completion without error.
    pub async fn stream(
        &self,
        session_id: &SessionId,
        question: &str,
    ) -> Result<AnswerStream, RaglineError> {
        validate_question(question)?;
        let history = self.sessions.get_or_create(session_id).lock_owned().await;

        let prepared = self.prepare(history.messages(), question).await?;
        let tokens = self
            .provider
            .stream(self.answer_request(prepared.messages))
            .await?;

        debug!(session_id = %session_id, "answer stream opened");
        Ok(recording_stream(
            tokens,
            history,
            session_id.clone(),
            question.to_string(),
        ))
    }
}

fn validate_question(question: &str) -> Result<(), RaglineError> {
    if question.trim().is_empty() {
        return Err(RaglineError::InvalidRequest(
            "question must not be empty".into(),
        ));
    }
    Ok(())
}

struct RecordingState {
    tokens: TokenStream,
    /// `None` once the turn has been recorded or abandoned.
    history: Option<OwnedMutexGuard<ConversationHistory>>,
    session_id: SessionId,
    question: String,
    answer: String,
}

/// Forwards provider text chunks and appends the turn to `history` when the
/// provider stream ends cleanly.
fn recording_stream(
    tokens: TokenStream,
    history: OwnedMutexGuard<ConversationHistory>,
    session_id: SessionId,
    question: String,
) -> AnswerStream {
    let state = RecordingState {
        tokens,
        history: Some(history),
        session_id,
        question,
        answer: String::new(),
    };

    let stream = stream::unfold(state, |mut state| async move {
        if state.history.is_none() {
            return None;
        }
        loop {
            match state.tokens.next().await {
                Some(Ok(chunk)) => {
                    let Some(text) = chunk.text else { continue };
                    if text.is_empty() {
                        continue;
                    }
                    state.answer.push_str(&text);
                    return Some((Ok(text), state));
                }
                Some(Err(e)) => {
                    warn!(
                        session_id = %state.session_id,
                        error = %e,
                        "answer stream failed, turn not recorded"
                    );
                    state.history = None;
                    return Some((Err(e), state));
                }
                None => {
                    if let Some(mut history) = state.history.take() {
                        let answer = std::mem::take(&mut state.answer);
                        history.push_turn(std::mem::take(&mut state.question), answer);
                        info!(
                            session_id = %state.session_id,
                            history_len = history.len(),
                            "streamed turn complete"
                        );
                    }
                    return None;
                }
            }
        }
    });

    Box::pin(stream)
}
