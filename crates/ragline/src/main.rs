// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ragline - conversational question answering over local documents.
//!
//! This is the binary entry point for ragline.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ragline_config::RaglineConfig;
use ragline_core::RaglineError;

/// Placeholder printed instead of a configured API key.
const REDACTED: &str = "[redacted]";

/// Ragline - conversational question answering over local documents.
#[derive(Parser, Debug)]
#[command(name = "ragline", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Index the configured documents and start the HTTP gateway.
    Serve,
    /// Ask one question and print the answer.
    Ask {
        /// The question to answer.
        question: String,
        /// Session identifier to tag this turn with. History is held in
        /// memory, so every `ask` starts from an empty one.
        #[arg(long)]
        session: Option<String>,
        /// Print the answer once complete instead of token by token.
        #[arg(long)]
        no_stream: bool,
    },
    /// Launch an interactive chat session.
    Chat {
        /// Session identifier for this chat. History lasts only as long as
        /// the process; a fresh identifier is generated when omitted.
        #[arg(long)]
        session: Option<String>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => ragline_config::load_and_validate_path(path),
        None => ragline_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            ragline_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Ask {
            question,
            session,
            no_stream,
        }) => shell::run_ask(config, session, &question, !no_stream).await,
        Some(Commands::Chat { session }) => shell::run_chat(config, session).await,
        Some(Commands::Config) => render_config(&config).map(|rendered| print!("{rendered}")),
        None => {
            println!("ragline: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so `ragline ask` output can be piped.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ragline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

/// Renders `config` as TOML with the API key redacted.
fn render_config(config: &RaglineConfig) -> Result<String, RaglineError> {
    let mut shown = config.clone();
    if shown.openai.api_key.is_some() {
        shown.openai.api_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| RaglineError::Internal(format!("failed to render configuration: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ask_with_flags() {
        let cli = Cli::try_parse_from([
            "ragline",
            "ask",
            "What is ragline?",
            "--session",
            "s1",
            "--no-stream",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Ask {
                question,
                session,
                no_stream,
            }) => {
                assert_eq!(question, "What is ragline?");
                assert_eq!(session.as_deref(), Some("s1"));
                assert!(no_stream);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["ragline", "chat", "--config", "/tmp/r.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/r.toml")));
        assert!(matches!(cli.command, Some(Commands::Chat { session: None })));
    }

    #[test]
    fn session_help_does_not_promise_persistence() {
        let command = Cli::command();
        let session_help = |name: &str| {
            command
                .find_subcommand(name)
                .and_then(|sub| sub.get_arguments().find(|a| a.get_id() == "session"))
                .and_then(|arg| arg.get_help())
                .map(|help| help.to_string())
                .unwrap()
        };

        let ask = session_help("ask");
        assert!(ask.starts_with("Session identifier to tag this turn with"));
        assert!(!ask.contains("continue"));
        assert!(session_help("chat").contains("only as long as the process"));
    }

    #[test]
    fn ask_requires_a_question() {
        assert!(Cli::try_parse_from(["ragline", "ask"]).is_err());
    }

    #[test]
    fn render_config_redacts_api_key() {
        let mut config = RaglineConfig::default();
        config.openai.api_key = Some("sk-very-secret".into());

        let rendered = render_config(&config).unwrap();
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("[retrieval]"));
        assert!(rendered.contains("top_k = 4"));
    }

    #[test]
    fn render_config_round_trips_through_loader() {
        let rendered = render_config(&RaglineConfig::default()).unwrap();
        assert!(!rendered.contains("api_key"));

        let parsed = ragline_config::load_and_validate_str(&rendered).unwrap();
        assert_eq!(parsed.gateway.port, RaglineConfig::default().gateway.port);
        assert_eq!(parsed.documents.separators, RaglineConfig::default().documents.separators);
    }
}
