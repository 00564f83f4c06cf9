//! Document text extraction.
//!
//! This module provides the [`DocumentExtractor`] trait and two implementations:
//!
//! - [`PdfExtractor`]: per-page plain text from PDF bytes via `lopdf`
//! - [`PlainTextExtractor`]: UTF-8 text, pages split on form feeds

use tracing::{debug, error, warn};

use crate::document::Page;
use crate::error::{QaError, Result};

/// Message shown to users when a PDF cannot be parsed.
const INVALID_PDF_MESSAGE: &str = "Please upload a valid PDF file.";

/// Page separator understood by [`PlainTextExtractor`].
const FORM_FEED: char = '\u{000C}';

/// Converts raw document bytes into ordered per-page text.
pub trait DocumentExtractor: Send + Sync {
    /// Extract the text of every page, in page order.
    ///
    /// Pages without extractable text yield an empty string rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::MalformedDocument`] if the bytes cannot be parsed.
    fn extract(&self, bytes: &[u8]) -> Result<Vec<Page>>;
}

/// Extracts per-page plain text from PDF documents.
///
/// Layout, tables and images are ignored; only text-showing operators are read.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<Page>> {
        let document = lopdf::Document::load_mem(bytes).map_err(|e| {
            error!(error = %e, byte_len = bytes.len(), "failed to parse pdf");
            QaError::MalformedDocument(INVALID_PDF_MESSAGE.to_string())
        })?;

        let page_numbers: Vec<u32> = document.get_pages().into_keys().collect();
        if page_numbers.is_empty() {
            error!(byte_len = bytes.len(), "pdf has no pages");
            return Err(QaError::MalformedDocument(INVALID_PDF_MESSAGE.to_string()));
        }

        let pages = page_numbers
            .iter()
            .enumerate()
            .map(|(number, page_number)| {
                let text = match document.extract_text(&[*page_number]) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(page = number, error = %e, "page text could not be extracted");
                        String::new()
                    }
                };
                Page::new(number, text)
            })
            .collect::<Vec<_>>();

        debug!(page_count = pages.len(), "extracted pdf text");
        Ok(pages)
    }
}

/// Treats the bytes as UTF-8 text, one page per form-feed separated section.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    /// Create a new plain text extractor.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<Page>> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            error!(error = %e, "text document is not utf8");
            QaError::MalformedDocument("text documents must be UTF-8 encoded.".to_string())
        })?;

        Ok(text.split(FORM_FEED).enumerate().map(|(number, page)| Page::new(number, page)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_extractor_rejects_non_pdf_bytes() {
        let err = PdfExtractor::new().extract(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, QaError::MalformedDocument(_)));
    }

    #[test]
    fn pdf_extractor_rejects_empty_buffer() {
        assert!(matches!(PdfExtractor::new().extract(&[]), Err(QaError::MalformedDocument(_))));
    }

    #[test]
    fn plain_text_splits_pages_on_form_feed() {
        let pages = PlainTextExtractor::new().extract("first\u{000C}\u{000C}third".as_bytes()).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0], Page::new(0, "first"));
        assert_eq!(pages[1], Page::new(1, ""));
        assert_eq!(pages[2], Page::new(2, "third"));
    }

    #[test]
    fn plain_text_rejects_invalid_utf8() {
        let err = PlainTextExtractor::new().extract(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, QaError::MalformedDocument(_)));
    }
}
