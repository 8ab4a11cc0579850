//! PDF text extraction.
//!
//! Only embedded text is read. Scanned statements come out as
//! [`PdfType::Empty`] and are left to an external OCR step.

mod extractor;

pub use extractor::{PdfContent, PdfExtractor};

use crate::error::PdfError;

/// Type of PDF content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfType {
    /// Contains extractable text.
    Text,
    /// No usable text (empty, or images only).
    Empty,
}

impl PdfType {
    /// Classify by the amount of extracted text.
    pub fn classify(text: &str, min_text_length: usize) -> Self {
        if text.trim().len() >= min_text_length {
            Self::Text
        } else {
            Self::Empty
        }
    }
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Analyze the PDF to determine its type.
    fn analyze(&self) -> PdfType;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(PdfType::classify("short", 50), PdfType::Empty);
        assert_eq!(PdfType::classify(&"x".repeat(60), 50), PdfType::Text);
        assert_eq!(PdfType::classify("   \n\n   ", 1), PdfType::Empty);
    }
}
