// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every ragline crate.

use thiserror::Error;

/// The primary error type used across collaborator traits and the chain.
#[derive(Debug, Error)]
pub enum RaglineError {
    /// Configuration errors (missing credential, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Language model errors (API failure, malformed response, broken stream).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding errors (API failure, wrong number of vectors).
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Vector index errors (dimension mismatch between query and stored vectors).
    #[error("index error: {message}")]
    Index { message: String },

    /// A document could not be read.
    #[error("failed to load document {path}: {source}")]
    Document {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The caller sent a request that cannot be processed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RaglineError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for an embedding error without an underlying source.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            source: None,
        }
    }

    /// True when the failure originated in an upstream collaborator call.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::Embedding { .. } | Self::Timeout { .. }
        )
    }
}
