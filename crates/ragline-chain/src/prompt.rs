// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt templates and message assembly for the two model calls of a turn.

use ragline_core::types::{Message, ScoredChunk};

/// System instruction for the standalone-question rephrase.
pub const REPHRASE_SYSTEM_PROMPT: &str = "Given the following conversation and a follow up \
question, rephrase the follow up question to be a standalone question.";

/// Final human message of the rephrase call. `{question}` is substituted.
pub const REPHRASE_HUMAN_TEMPLATE: &str =
    "Rephrase the following question as a standalone question:\n{question}";

/// System instruction for the answer call. `{context}` is substituted.
pub const ANSWER_SYSTEM_TEMPLATE: &str = "You are an experienced researcher, \
expert at interpreting and answering questions based on provided sources.
Using the below provided context and chat history, \
answer the user's question to the best of your ability \
using only the resources provided. Be verbose!

<context>
{context}
</context>";

/// Final human message of the answer call. `{standalone_question}` is substituted.
pub const ANSWER_HUMAN_TEMPLATE: &str =
    "Now, answer this question using the previous context and chat history:\n{standalone_question}";

/// Messages for the rephrase call: instruction, prior turns, follow-up.
pub fn rephrase_messages(history: &[Message], question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(REPHRASE_SYSTEM_PROMPT));
    messages.extend_from_slice(history);
    messages.push(Message::human(
        REPHRASE_HUMAN_TEMPLATE.replace("{question}", question),
    ));
    messages
}

/// Wraps each chunk in `<doc>` delimiters and joins them with newlines.
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("<doc>\n{}\n</doc>", c.chunk.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Messages for the answer call: instructions with context, prior turns,
/// standalone question.
pub fn answer_messages(
    context: &str,
    history: &[Message],
    standalone_question: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(
        ANSWER_SYSTEM_TEMPLATE.replace("{context}", context),
    ));
    messages.extend_from_slice(history);
    messages.push(Message::human(
        ANSWER_HUMAN_TEMPLATE.replace("{standalone_question}", standalone_question),
    ));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragline_core::types::{Chunk, Role};

    fn scored(text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(text),
            score: 1.0,
        }
    }

    #[test]
    fn context_wraps_each_chunk() {
        let context = format_context(&[scored("alpha"), scored("beta")]);
        assert_eq!(context, "<doc>\nalpha\n</doc>\n<doc>\nbeta\n</doc>");
    }

    #[test]
    fn empty_context_is_empty_string() {
        assert_eq!(format_context(&[]), "");
        let messages = answer_messages("", &[], "q");
        assert!(messages[0].content.contains("<context>\n\n</context>"));
    }

    #[test]
    fn rephrase_messages_place_history_between() {
        let history = vec![Message::human("Q1"), Message::assistant("A1")];
        let messages = rephrase_messages(&history, "Can you list them?");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1], Message::human("Q1"));
        assert_eq!(messages[2], Message::assistant("A1"));
        assert_eq!(
            messages[3].content,
            "Rephrase the following question as a standalone question:\nCan you list them?"
        );
    }

    #[test]
    fn answer_messages_embed_context_and_question() {
        let history = vec![Message::human("How are you?"), Message::assistant("Fine, thank you!")];
        let messages = answer_messages("fake retrieved content", &history, "Why is the sky blue?");

        assert_eq!(messages.len(), 4);
        assert!(messages[0].content.ends_with("<context>\nfake retrieved content\n</context>"));
        assert!(messages[0].content.starts_with("You are an experienced researcher"));
        assert_eq!(&messages[1..3], history.as_slice());
        assert_eq!(messages[3].role, Role::Human);
        assert!(messages[3].content.ends_with("chat history:\nWhy is the sky blue?"));
    }

    #[test]
    fn placeholders_in_user_text_are_not_expanded() {
        let messages = answer_messages("ctx", &[], "what is {context}?");
        assert!(messages[3].content.ends_with("what is {context}?"));
    }
}
