// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ragline ask` and `ragline chat` command implementations.
//!
//! Both build the same chain as `ragline serve` and print streamed answers
//! straight to stdout. `chat` keeps one session across a readline loop.

use std::io::Write;

use colored::Colorize;
use futures::StreamExt;
use ragline_chain::ConversationalRetrievalChain;
use ragline_config::RaglineConfig;
use ragline_core::RaglineError;
use ragline_core::types::{Role, SessionId};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::serve::build_chain;

/// Runs the `ragline ask` command: one turn, then exit.
pub async fn run_ask(
    config: RaglineConfig,
    session: Option<String>,
    question: &str,
    stream: bool,
) -> Result<(), RaglineError> {
    let chain = build_chain(&config).await?;
    let session_id = session_or_new(session);

    if stream {
        stream_answer(&chain, &session_id, question).await
    } else {
        let output = chain.invoke(&session_id, question).await?;
        println!("{}", output.answer);
        Ok(())
    }
}

/// Runs the `ragline chat` interactive REPL.
pub async fn run_chat(config: RaglineConfig, session: Option<String>) -> Result<(), RaglineError> {
    let chain = build_chain(&config).await?;
    let session_id = session_or_new(session);

    let mut rl = DefaultEditor::new()
        .map_err(|e| RaglineError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "ragline chat".bold().green());
    println!("{}", format!("session {session_id}").dimmed());
    println!(
        "Type {} to show this session, {} to exit.\n",
        "/history".yellow(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", "you".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if trimmed == "/history" {
                    print_history(&chain, &session_id).await;
                    continue;
                }

                if let Err(e) = stream_answer(&chain, &session_id, trimmed).await {
                    eprintln!("{}: {e}", "error".red());
                }
            }
            // Ctrl+C / Ctrl+D
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Streams one answer to stdout, flushing after every token.
async fn stream_answer(
    chain: &ConversationalRetrievalChain,
    session_id: &SessionId,
    question: &str,
) -> Result<(), RaglineError> {
    let mut tokens = chain.stream(session_id, question).await?;
    let mut stdout = std::io::stdout();
    while let Some(token) = tokens.next().await {
        match token {
            Ok(text) => {
                print!("{text}");
                let _ = stdout.flush();
            }
            Err(e) => {
                println!();
                return Err(e);
            }
        }
    }
    println!();
    Ok(())
}

async fn print_history(chain: &ConversationalRetrievalChain, session_id: &SessionId) {
    let messages = chain.sessions().snapshot(session_id).await;
    if messages.is_empty() {
        println!("{}", "(no messages yet)".dimmed());
        return;
    }
    for message in messages {
        let role = match message.role {
            Role::Human => "you".green(),
            Role::Assistant => "ragline".cyan(),
            Role::System => "system".yellow(),
        };
        println!("{role}: {}", message.content);
    }
}

/// Uses the requested session, or a fresh `cli-<uuid>` one when none (or a
/// blank one) was given.
fn session_or_new(session: Option<String>) -> SessionId {
    session
        .filter(|s| !s.trim().is_empty())
        .map(SessionId)
        .unwrap_or_else(|| SessionId(format!("cli-{}", uuid::Uuid::new_v4())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_session_is_kept() {
        assert_eq!(session_or_new(Some("notes".into())).as_str(), "notes");
    }

    #[test]
    fn missing_or_blank_session_gets_fresh_id() {
        let a = session_or_new(None);
        let b = session_or_new(Some("  ".into()));
        assert!(a.as_str().starts_with("cli-"));
        assert!(b.as_str().starts_with("cli-"));
        assert_ne!(a, b);
    }
}
