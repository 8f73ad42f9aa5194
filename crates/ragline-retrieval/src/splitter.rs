// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recursive character text splitter.
//!
//! Splits on the first separator present in the text, recurses into pieces
//! that are still too long using the remaining separators, then merges
//! adjacent pieces back up to `chunk_size` with `chunk_overlap` characters of
//! carry-over. Separators are kept at the end of the piece they follow, so a
//! chunk is always a trimmed slice of its source. All lengths are measured in
//! chars, separators included.

use std::collections::VecDeque;

use ragline_config::model::DocumentsConfig;
use ragline_core::types::Chunk;

/// Metadata key recording a chunk's position within its source document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// Sizing and separator settings for [`RecursiveSplitter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Most meaningful first; `""` splits into single characters.
    pub separators: Vec<String>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self::from(&DocumentsConfig::default())
    }
}

impl From<&DocumentsConfig> for SplitterConfig {
    fn from(config: &DocumentsConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            separators: config.separators.clone(),
        }
    }
}

impl SplitterConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    config: SplitterConfig,
}

impl RecursiveSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Splits raw text into bounded pieces.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, &self.config.separators)
    }

    /// Splits a document, copying its metadata onto every piece and tagging
    /// each with its `chunk_index`.
    pub fn split_chunk(&self, document: &Chunk) -> Vec<Chunk> {
        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut chunk = Chunk::new(text);
                chunk.metadata = document.metadata.clone();
                chunk.with_metadata(CHUNK_INDEX_KEY, i.to_string())
            })
            .collect()
    }

    /// Splits every document in order.
    pub fn split_chunks(&self, documents: &[Chunk]) -> Vec<Chunk> {
        documents.iter().flat_map(|d| self.split_chunk(d)).collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (separator, remaining) = pick_separator(text, separators);
        // Each separator stays on the piece before it, so joined pieces are
        // exact slices of the source text.
        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split_inclusive(separator).collect()
        };

        let mut output = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) < self.config.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                output.extend(self.merge(&fitting));
                fitting.clear();
            }

            if remaining.is_empty() {
                // Nothing finer to split on; keep the oversized piece whole.
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    output.push(trimmed.to_string());
                }
            } else {
                output.extend(self.split_recursive(piece, remaining));
            }
        }

        if !fitting.is_empty() {
            output.extend(self.merge(&fitting));
        }
        output
    }

    /// Greedily concatenates pieces up to `chunk_size`, starting each new
    /// chunk with as many trailing pieces of the previous one as fit within
    /// `chunk_overlap`.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let size = self.config.chunk_size;
        let mut docs = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        // Concatenated length of `window`.
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if !window.is_empty() && total + len > size {
                push_joined(&mut docs, &window);

                while let Some(front) = window.front() {
                    if total <= self.config.chunk_overlap && total + len <= size {
                        break;
                    }
                    total -= char_len(front);
                    window.pop_front();
                }
            }

            total += len;
            window.push_back(piece);
        }

        push_joined(&mut docs, &window);
        docs
    }
}

impl Default for RecursiveSplitter {
    fn default() -> Self {
        Self::new(SplitterConfig::default())
    }
}

/// First separator that occurs in `text` (or the empty separator), plus the
/// finer separators after it.
fn pick_separator<'a>(text: &str, separators: &'a [String]) -> (&'a str, &'a [String]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return ("", &[]);
        }
        if text.contains(sep.as_str()) {
            return (sep.as_str(), &separators[i + 1..]);
        }
    }
    ("", &[])
}

fn push_joined(docs: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
