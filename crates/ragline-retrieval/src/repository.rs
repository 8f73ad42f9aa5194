// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local repository checkout loader.
//!
//! Walks a checkout the way git sees it: `.gitignore`, `.git/info/exclude`
//! and hidden entries are skipped, plus any extra `ignore_paths` patterns.
//! Every remaining UTF-8 file becomes one document; binary files are skipped.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use ragline_config::model::RepositoryConfig;
use ragline_core::error::RaglineError;
use ragline_core::traits::DocumentLoader;
use ragline_core::types::Chunk;
use tracing::{debug, info};

use crate::loader::{SOURCE_KEY, document_error};

/// Metadata key holding the checkout root a document was read from.
pub const REPOSITORY_KEY: &str = "repository";

#[derive(Debug, Clone)]
pub struct RepositoryLoader {
    root: PathBuf,
    ignore_paths: Vec<String>,
    recursive: bool,
}

impl RepositoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore_paths: Vec::new(),
            recursive: true,
        }
    }

    pub fn from_config(config: &RepositoryConfig) -> Self {
        Self {
            root: PathBuf::from(&config.path),
            ignore_paths: config.ignore_paths.clone(),
            recursive: config.recursive,
        }
    }

    /// Extra gitignore-style patterns to skip.
    #[must_use]
    pub fn with_ignore_paths(mut self, patterns: Vec<String>) -> Self {
        self.ignore_paths = patterns;
        self
    }

    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Lists the files the checkout would contribute, in sorted path order.
    ///
    /// Blocking; [`DocumentLoader::load`] runs it on the blocking pool.
    pub fn discover(&self) -> Result<Vec<PathBuf>, RaglineError> {
        let mut overrides = OverrideBuilder::new(&self.root);
        for pattern in &self.ignore_paths {
            overrides
                .add(&format!("!{pattern}"))
                .map_err(|e| document_error(&self.root, e))?;
        }
        let overrides = overrides
            .build()
            .map_err(|e| document_error(&self.root, e))?;

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .require_git(false)
            .parents(false)
            .overrides(overrides)
            .sort_by_file_path(|a, b| a.cmp(b));
        if !self.recursive {
            builder.max_depth(Some(1));
        }

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry.map_err(|e| document_error(&self.root, e))?;
            if entry.file_type().is_some_and(|t| t.is_file()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

#[async_trait]
impl DocumentLoader for RepositoryLoader {
    async fn load(&self) -> Result<Vec<Chunk>, RaglineError> {
        let walker = self.clone();
        let files = tokio::task::spawn_blocking(move || walker.discover())
            .await
            .map_err(|e| document_error(&self.root, e))??;

        let repository = self.root.display().to_string();
        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| document_error(&path, e))?;
            let Ok(text) = String::from_utf8(bytes) else {
                debug!(path = %path.display(), "skipping binary file");
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            documents.push(
                Chunk::new(text)
                    .with_metadata(SOURCE_KEY, self.relative(&path).display().to_string())
                    .with_metadata(REPOSITORY_KEY, repository.clone()),
            );
        }

        info!(repository = %repository, documents = documents.len(), "repository loaded");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &[u8]) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, body).unwrap();
    }

    fn checkout() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".gitignore", b"dist/\n*.log\n");
        write(dir.path(), "README.md", b"# Example");
        write(dir.path(), "yarn.lock", b"lockfile");
        write(dir.path(), "src/index.ts", b"export const answer = 42;");
        write(dir.path(), "dist/bundle.js", b"compiled");
        write(dir.path(), "debug.log", b"noise");
        write(dir.path(), ".git/HEAD", b"ref: refs/heads/main");
        write(dir.path(), "logo.png", &[0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe]);
        dir
    }

    fn sources(docs: &[Chunk]) -> Vec<&str> {
        docs.iter().map(|d| d.source().unwrap()).collect()
    }

    #[tokio::test]
    async fn honors_gitignore_and_skips_hidden_and_binary() {
        let dir = checkout();
        let docs = RepositoryLoader::new(dir.path()).load().await.unwrap();

        assert_eq!(sources(&docs), ["README.md", "src/index.ts", "yarn.lock"]);
        let root = dir.path().display().to_string();
        assert!(docs.iter().all(|d| d.metadata[REPOSITORY_KEY] == root));
    }

    #[tokio::test]
    async fn ignore_paths_add_patterns() {
        let dir = checkout();
        let docs = RepositoryLoader::new(dir.path())
            .with_ignore_paths(vec!["*.md".into(), "yarn.lock".into()])
            .load()
            .await
            .unwrap();
        assert_eq!(sources(&docs), ["src/index.ts"]);
    }

    #[tokio::test]
    async fn non_recursive_stays_at_top_level() {
        let dir = checkout();
        let config = RepositoryConfig {
            path: dir.path().display().to_string(),
            ignore_paths: vec![],
            recursive: false,
        };
        let docs = RepositoryLoader::from_config(&config).load().await.unwrap();
        assert_eq!(sources(&docs), ["README.md", "yarn.lock"]);
    }

    #[tokio::test]
    async fn missing_checkout_is_document_error() {
        let err = RepositoryLoader::new("/nonexistent/ragline/checkout")
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, RaglineError::Document { .. }));
    }

    #[test]
    fn invalid_ignore_pattern_is_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RepositoryLoader::new(dir.path())
            .with_ignore_paths(vec!["[unclosed".into()])
            .discover()
            .unwrap_err();
        assert!(matches!(err, RaglineError::Document { .. }));
    }
}
