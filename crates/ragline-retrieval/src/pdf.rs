// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PDF text extraction.
//!
//! Each page with text becomes its own document, tagged with its 1-based
//! page number. Parsing runs on the blocking pool.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lopdf::Document;
use ragline_core::error::RaglineError;
use ragline_core::traits::DocumentLoader;
use ragline_core::types::Chunk;
use tracing::debug;

use crate::loader::{SOURCE_KEY, document_error};

/// Metadata key holding the page a PDF document was extracted from.
pub const PAGE_KEY: &str = "page";

/// Returns true when `path` has a `.pdf` extension, in any case.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Extracts `(page number, text)` for every page that carries text, in page
/// order.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<(u32, String)>, lopdf::Error> {
    let document = Document::load_mem(bytes)?;
    let mut pages = Vec::new();
    for &number in document.get_pages().keys() {
        let text = document.extract_text(&[number])?;
        if text.trim().is_empty() {
            continue;
        }
        pages.push((number, text));
    }
    Ok(pages)
}

/// Loads one PDF file as one document per page.
#[derive(Debug, Clone)]
pub struct PdfLoader {
    path: PathBuf,
}

impl PdfLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self) -> Result<Vec<Chunk>, RaglineError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| document_error(&self.path, e))?;

        let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes))
            .await
            .map_err(|e| document_error(&self.path, e))?
            .map_err(|e| document_error(&self.path, invalid_pdf(e)))?;

        debug!(path = %self.path.display(), pages = pages.len(), "pdf extracted");
        let source = self.path.display().to_string();
        Ok(pages
            .into_iter()
            .map(|(number, text)| {
                Chunk::new(text)
                    .with_metadata(SOURCE_KEY, source.clone())
                    .with_metadata(PAGE_KEY, number.to_string())
            })
            .collect())
    }
}

fn invalid_pdf(err: lopdf::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

/// Builds a minimal PDF with one text line per page.
#[cfg(test)]
pub(crate) fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for line in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => [0, 0, 612, 792].map(Object::Integer).to_vec(),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_pdf_extension() {
        assert!(is_pdf(Path::new("lecture.pdf")));
        assert!(is_pdf(Path::new("LECTURE.PDF")));
        assert!(!is_pdf(Path::new("notes.md")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[test]
    fn extracts_text_per_page() {
        let bytes = sample_pdf(&["Machine learning lecture", "Supervised learning"]);
        let pages = extract_pages(&bytes).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].0, 1);
        assert!(pages[0].1.contains("Machine learning lecture"));
        assert_eq!(pages[1].0, 2);
        assert!(pages[1].1.contains("Supervised learning"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(extract_pages(b"not a pdf at all").is_err());
    }

    #[tokio::test]
    async fn loader_tags_source_and_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecture.pdf");
        std::fs::write(&path, sample_pdf(&["First page", "Second page"])).unwrap();

        let docs = PdfLoader::new(&path).load().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].source().unwrap().ends_with("lecture.pdf"));
        assert_eq!(docs[0].metadata[PAGE_KEY], "1");
        assert_eq!(docs[1].metadata[PAGE_KEY], "2");
        assert!(docs[1].text.contains("Second page"));
    }

    #[tokio::test]
    async fn corrupt_pdf_is_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not really a pdf").unwrap();

        let err = PdfLoader::new(&path).load().await.unwrap_err();
        assert!(matches!(err, RaglineError::Document { .. }));
        assert!(err.to_string().contains("broken.pdf"));
    }
}
