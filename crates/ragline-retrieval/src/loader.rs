// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File loader for plain-text and PDF documents.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ragline_config::model::DocumentsConfig;
use ragline_core::error::RaglineError;
use ragline_core::traits::DocumentLoader;
use ragline_core::types::Chunk;
use tracing::{debug, info};

use crate::pdf::{PdfLoader, is_pdf};

/// Metadata key holding the file a chunk was read from.
pub const SOURCE_KEY: &str = "source";

/// Loads files and directory trees as whole-document chunks.
///
/// Explicitly listed files are always read. Directories contribute files
/// whose extension is in `extensions`, visited in sorted path order. PDF files
/// yield one document per page; everything else is read as UTF-8 text.
#[derive(Debug, Clone)]
pub struct FileLoader {
    paths: Vec<PathBuf>,
    extensions: Vec<String>,
    recursive: bool,
}

impl FileLoader {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            extensions: vec!["txt".into(), "md".into()],
            recursive: true,
        }
    }

    pub fn from_config(config: &DocumentsConfig) -> Self {
        Self {
            paths: config.paths.iter().map(PathBuf::from).collect(),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            recursive: config.recursive,
        }
    }

    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Resolves the configured paths to the ordered list of files to read.
    pub async fn discover(&self) -> Result<Vec<PathBuf>, RaglineError> {
        let mut files = Vec::new();
        for path in &self.paths {
            let meta = tokio::fs::metadata(path)
                .await
                .map_err(|e| document_error(path, e))?;
            if meta.is_dir() {
                let mut found = self.walk(path).await?;
                found.sort();
                files.extend(found);
            } else {
                files.push(path.clone());
            }
        }
        Ok(files)
    }

    async fn walk(&self, root: &Path) -> Result<Vec<PathBuf>, RaglineError> {
        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| document_error(&dir, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| document_error(&dir, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| document_error(&path, e))?;
                if file_type.is_dir() {
                    if self.recursive {
                        pending.push(path);
                    }
                } else if self.matches_extension(&path) {
                    files.push(path);
                }
            }
        }
        Ok(files)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
    }
}

#[async_trait]
impl DocumentLoader for FileLoader {
    async fn load(&self) -> Result<Vec<Chunk>, RaglineError> {
        let files = self.discover().await?;
        let mut documents = Vec::with_capacity(files.len());

        for path in files {
            if is_pdf(&path) {
                documents.extend(PdfLoader::new(&path).load().await?);
                continue;
            }
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| document_error(&path, e))?;
            if text.trim().is_empty() {
                debug!(path = %path.display(), "skipping empty document");
                continue;
            }
            documents.push(Chunk::new(text).with_metadata(SOURCE_KEY, path.display().to_string()));
        }

        info!(documents = documents.len(), "documents loaded");
        Ok(documents)
    }
}

pub(crate) fn document_error<E>(path: &Path, err: E) -> RaglineError
where
    E: std::error::Error + Send + Sync + 'static,
{
    RaglineError::Document {
        path: path.display().to_string(),
        source: Box::new(err),
    }
}
