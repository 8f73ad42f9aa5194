// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::{RaglineConfig, SUPPORTED_CONTENT_TYPES};

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation rather than stopping at the first.
pub fn validate_config(config: &RaglineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.gateway.host.trim().is_empty() {
        fail("gateway.host must not be empty".to_string());
    }

    if !SUPPORTED_CONTENT_TYPES.contains(&config.gateway.content_type.as_str()) {
        fail(format!(
            "gateway.content_type `{}` is not supported (expected one of: {})",
            config.gateway.content_type,
            SUPPORTED_CONTENT_TYPES.join(", ")
        ));
    }

    let docs = &config.documents;
    if docs.paths.iter().all(|p| p.trim().is_empty()) && docs.repositories.is_empty() {
        fail(
            "documents.paths or documents.repositories must name at least one source"
                .to_string(),
        );
    }
    for (i, repo) in docs.repositories.iter().enumerate() {
        if repo.path.trim().is_empty() {
            fail(format!("documents.repositories[{i}].path must not be empty"));
        }
    }

    if docs.chunk_size == 0 {
        fail("documents.chunk_size must be greater than 0".to_string());
    } else if docs.chunk_overlap >= docs.chunk_size {
        fail(format!(
            "documents.chunk_overlap ({}) must be smaller than documents.chunk_size ({})",
            docs.chunk_overlap, docs.chunk_size
        ));
    }

    if config.retrieval.top_k == 0 {
        fail("retrieval.top_k must be at least 1".to_string());
    }

    if let Some(max) = config.session.max_history_messages
        && max < 2
    {
        fail(format!(
            "session.max_history_messages must be at least 2 (one exchange), got {max}"
        ));
    }

    let temperatures = [
        ("openai.rephrase_temperature", Some(config.openai.rephrase_temperature)),
        ("openai.answer_temperature", config.openai.answer_temperature),
    ];
    for (key, value) in temperatures {
        if let Some(t) = value
            && !(0.0..=2.0).contains(&t)
        {
            fail(format!("{key} must be between 0.0 and 2.0, got {t}"));
        }
    }

    if config.openai.base_url.trim().is_empty() {
        fail("openai.base_url must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
