// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so that a misspelled key
//! is reported at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level ragline configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RaglineConfig {
    /// Process-level settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Language model and embedding API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Document loading and splitting.
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Context retrieval.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Conversation history retention.
    #[serde(default)]
    pub session: SessionConfig,

    /// HTTP front door.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// OpenAI-compatible API configuration.
///
/// The same credential is used for chat completions and embeddings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL, without a trailing `/chat/completions`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for both the rephrase and the answer calls.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Sampling temperature for the standalone-question rephrase.
    #[serde(default = "default_rephrase_temperature")]
    pub rephrase_temperature: f32,

    /// Sampling temperature for the answer. `None` uses the API default.
    #[serde(default)]
    pub answer_temperature: Option<f32>,

    /// Cap on generated tokens per call. `None` uses the API default.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on transient HTTP errors (429/500/502/503). Zero disables retry.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            rephrase_temperature: default_rephrase_temperature(),
            answer_temperature: None,
            max_tokens: None,
            embedding_model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-3.5-turbo-1106".to_string()
}

fn default_rephrase_temperature() -> f32 {
    0.1
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

/// Document loading and splitting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentsConfig {
    /// Files or directories to load.
    #[serde(default = "default_paths")]
    pub paths: Vec<String>,

    /// File extensions (without dot) picked up when walking a directory.
    /// Add `pdf` to extract text from PDF files page by page.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Walk subdirectories.
    #[serde(default = "default_recursive")]
    pub recursive: bool,

    /// Local repository checkouts loaded file by file, honoring `.gitignore`.
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,

    /// Maximum chunk length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters carried over from the end of one chunk into the next.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Split points, most meaningful first. The empty string splits per character.
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            paths: default_paths(),
            extensions: default_extensions(),
            recursive: default_recursive(),
            repositories: Vec::new(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            separators: default_separators(),
        }
    }
}

fn default_paths() -> Vec<String> {
    vec!["data".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec!["txt".to_string(), "md".to_string()]
}

fn default_recursive() -> bool {
    true
}

fn default_chunk_size() -> usize {
    1536
}

fn default_chunk_overlap() -> usize {
    128
}

fn default_separators() -> Vec<String> {
    ["\n\n", "\n", ". ", " ", ""]
        .into_iter()
        .map(String::from)
        .collect()
}

/// A repository checkout on local disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Root of the checkout.
    pub path: String,

    /// Gitignore-style patterns to skip in addition to the repository's own
    /// ignore files, e.g. `*.md` or `yarn.lock`.
    #[serde(default)]
    pub ignore_paths: Vec<String>,

    /// Walk subdirectories.
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

/// Context retrieval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Number of chunks placed into the answer prompt.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    4
}

/// Conversation history retention.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Keep at most this many messages per session, dropping the oldest
    /// whole turns. `None` keeps everything.
    #[serde(default)]
    pub max_history_messages: Option<usize>,
}

/// HTTP front door configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Response body format: `text/plain` or `text/event-stream`.
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            content_type: default_content_type(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_content_type() -> String {
    "text/plain".to_string()
}

/// Content types the gateway knows how to produce.
pub const SUPPORTED_CONTENT_TYPES: &[&str] = &["text/plain", "text/event-stream"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_lesson_values() {
        let config = RaglineConfig::default();
        assert_eq!(config.documents.chunk_size, 1536);
        assert_eq!(config.documents.chunk_overlap, 128);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.openai.chat_model, "gpt-3.5-turbo-1106");
        assert!((config.openai.rephrase_temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.openai.max_retries, 0);
        assert!(config.session.max_history_messages.is_none());
    }

    #[test]
    fn separators_end_with_character_fallback() {
        let seps = default_separators();
        assert_eq!(seps.first().map(String::as_str), Some("\n\n"));
        assert_eq!(seps.last().map(String::as_str), Some(""));
    }

    #[test]
    fn gateway_deny_unknown_fields() {
        let result = toml::from_str::<RaglineConfig>("[gateway]\nprot = 8080\n");
        assert!(result.is_err());
    }

    #[test]
    fn repositories_parse_with_defaults() {
        let source = r#"
            [[documents.repositories]]
            path = "../langchainjs"
            ignore_paths = ["*.md", "yarn.lock"]
        "#;
        let config: RaglineConfig = toml::from_str(source).unwrap();
        let repo = &config.documents.repositories[0];
        assert_eq!(repo.path, "../langchainjs");
        assert_eq!(repo.ignore_paths, ["*.md", "yarn.lock"]);
        assert!(repo.recursive);
        assert!(RaglineConfig::default().documents.repositories.is_empty());
    }

    #[test]
    fn session_limit_parses() {
        let config: RaglineConfig =
            toml::from_str("[session]\nmax_history_messages = 20\n").unwrap();
        assert_eq!(config.session.max_history_messages, Some(20));
    }
}
