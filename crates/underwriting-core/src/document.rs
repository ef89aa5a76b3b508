//! PDF text loading
//!
//! Turns an uploaded byte stream into pages of lines. Extraction goes through
//! lopdf page by page first; when that yields nothing (unusual font setups)
//! the whole document is handed to pdf-extract and split on form feeds.
//!
//! pdf-extract and lopdf can both panic on malformed input, so every call is
//! made behind [`std::panic::catch_unwind`].
//!
//! # Example
//! ```no_run
//! use underwriting_core::document::{DocumentError, ExtractedDocument};
//!
//! fn count_lines(pdf_bytes: &[u8]) -> Result<usize, DocumentError> {
//!     let document = ExtractedDocument::from_pdf_bytes(pdf_bytes)?;
//!     Ok(document.lines().count())
//! }
//! ```

use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

/// Why a document could not be turned into text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("not a PDF (missing %PDF header)")]
    NotPdf,

    #[error("password-protected PDF")]
    Encrypted,

    #[error("malformed PDF: {0}")]
    Malformed(String),

    #[error("no extractable text (scanned document?)")]
    NoText,
}

/// A decoded document: pages of lines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Page-by-page content, in document order
    pub pages: Vec<PageText>,
}

/// Text of a single page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// Page number (1-indexed)
    pub page_number: usize,

    /// Lines in reading order
    pub lines: Vec<TextLine>,
}

/// A single line of page text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,

    /// Line number within the page (1-indexed)
    pub line_number: usize,
}

/// A line together with the page it sits on
#[derive(Debug, Clone, Copy)]
pub struct LineRef<'a> {
    pub page: usize,
    pub line: usize,
    pub text: &'a str,
}

impl ExtractedDocument {
    /// Decode PDF bytes into pages of lines
    ///
    /// # Errors
    /// - [`DocumentError::NotPdf`] if the stream does not start with `%PDF`
    /// - [`DocumentError::Encrypted`] for password-protected files
    /// - [`DocumentError::Malformed`] if the PDF cannot be parsed
    /// - [`DocumentError::NoText`] if no page carries any visible text
    pub fn from_pdf_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        if !is_pdf(bytes) {
            return Err(DocumentError::NotPdf);
        }

        let mut page_texts = guarded(|| lopdf_pages(bytes))?;
        if page_texts.iter().all(|t| t.trim().is_empty()) {
            debug!("lopdf produced no text, falling back to pdf-extract");
            // The file already parsed, so a fallback failure only means "no text"
            match guarded(|| pdf_extract_pages(bytes)) {
                Ok(texts) => page_texts = texts,
                Err(e) => debug!(error = %e, "pdf-extract fallback failed"),
            }
        }

        let document = Self::from_pages(page_texts.iter().map(String::as_str));
        if document.lines().all(|l| l.text.trim().is_empty()) {
            return Err(DocumentError::NoText);
        }

        debug!(
            pages = document.pages.len(),
            lines = document.lines().count(),
            "decoded PDF"
        );
        Ok(document)
    }

    /// Build a document from plain text; form feeds separate pages
    pub fn from_text(text: &str) -> Self {
        Self::from_pages(text.split('\x0C'))
    }

    fn from_pages<'a>(pages: impl IntoIterator<Item = &'a str>) -> Self {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(idx, text)| PageText {
                page_number: idx + 1,
                lines: text
                    .lines()
                    .enumerate()
                    .map(|(line_idx, line)| TextLine {
                        text: line.to_string(),
                        line_number: line_idx + 1,
                    })
                    .collect(),
            })
            .collect();

        Self { pages }
    }

    /// Every line in document order
    pub fn lines(&self) -> impl Iterator<Item = LineRef<'_>> {
        self.pages.iter().flat_map(|page| {
            page.lines.iter().map(move |line| LineRef {
                page: page.page_number,
                line: line.line_number,
                text: line.text.as_str(),
            })
        })
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Check the `%PDF` magic bytes (leading whitespace tolerated)
pub fn is_pdf(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(b"%PDF")
}

fn lopdf_pages(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let doc = Document::load_mem(bytes).map_err(classify_load_error)?;
    if doc.is_encrypted() {
        return Err(DocumentError::Encrypted);
    }

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        // A page whose content stream lopdf cannot decode still counts as a page
        let text = match doc.extract_text(&[*page_number]) {
            Ok(text) => text,
            Err(e) => {
                trace!(page = page_number, error = %e, "page text unavailable");
                String::new()
            }
        };
        pages.push(text);
    }

    Ok(pages)
}

fn pdf_extract_pages(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| DocumentError::Malformed(e.to_string()))?;

    Ok(text.split('\x0C').map(str::to_string).collect())
}

fn classify_load_error(err: lopdf::Error) -> DocumentError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("encrypt") || lower.contains("password") || lower.contains("decrypt") {
        DocumentError::Encrypted
    } else {
        DocumentError::Malformed(message)
    }
}

/// Run a PDF backend, turning a panic into [`DocumentError::Malformed`]
fn guarded<T>(f: impl FnOnce() -> Result<T, DocumentError>) -> Result<T, DocumentError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(_) => Err(DocumentError::Malformed(
            "PDF backend panicked on malformed document".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::TextPdfWriter;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_text_splits_pages_and_lines() {
        let doc = ExtractedDocument::from_text("Line 1\nLine 2\x0CPage two\nLine 2\nLine 3");

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[0].lines.len(), 2);
        assert_eq!(doc.pages[1].page_number, 2);
        assert_eq!(doc.pages[1].lines[2].text, "Line 3");
        assert_eq!(doc.pages[1].lines[2].line_number, 3);
    }

    #[test]
    fn test_lines_iterates_in_document_order() {
        let doc = ExtractedDocument::from_text("a\nb\x0Cc");
        let seen: Vec<(usize, usize, &str)> =
            doc.lines().map(|l| (l.page, l.line, l.text)).collect();
        assert_eq!(seen, vec![(1, 1, "a"), (1, 2, "b"), (2, 1, "c")]);
    }

    #[test]
    fn test_rejects_non_pdf() {
        assert_eq!(
            ExtractedDocument::from_pdf_bytes(b"hello world").unwrap_err(),
            DocumentError::NotPdf
        );
        assert_eq!(
            ExtractedDocument::from_pdf_bytes(b"").unwrap_err(),
            DocumentError::NotPdf
        );
    }

    #[test]
    fn test_truncated_pdf_is_malformed_not_panic() {
        let result = ExtractedDocument::from_pdf_bytes(b"%PDF-1.7\n1 0 obj << /Type");
        assert!(matches!(result, Err(DocumentError::Malformed(_))));
    }

    #[test]
    fn test_is_pdf_tolerates_leading_whitespace() {
        assert!(is_pdf(b"%PDF-1.5"));
        assert!(is_pdf(b"\n  %PDF-1.5"));
        assert!(!is_pdf(b"PDF-1.5"));
    }

    #[test]
    fn test_decodes_generated_pdf() {
        let bytes = TextPdfWriter::new()
            .line("Statement of Remuneration Paid")
            .line("14  1,200.50")
            .finish()
            .unwrap();

        let doc = ExtractedDocument::from_pdf_bytes(&bytes).unwrap();
        let texts: Vec<&str> = doc.lines().map(|l| l.text.trim()).collect();
        assert!(texts.contains(&"Statement of Remuneration Paid"));
        assert!(texts.contains(&"14  1,200.50"));
    }

    #[test]
    fn test_blank_pdf_has_no_text() {
        let bytes = TextPdfWriter::new().finish().unwrap();
        assert_eq!(
            ExtractedDocument::from_pdf_bytes(&bytes).unwrap_err(),
            DocumentError::NoText
        );
    }
}
