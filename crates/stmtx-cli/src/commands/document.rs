//! Reading statement text from disk.

use std::fs;
use std::path::Path;

use tracing::debug;

use stmtx_core::models::config::StmtxConfig;
use stmtx_core::pdf::{PdfExtractor, PdfType};

/// File extensions accepted as statements.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "text", "pdf"];

/// Whether the path has a supported statement extension.
pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Read the text of a statement: plain text as UTF-8, PDFs through text
/// extraction.
pub fn read_document(path: &Path, config: &StmtxConfig) -> anyhow::Result<String> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let ext = extension(path).unwrap_or_default();
    let text = match ext.as_str() {
        "txt" | "text" => fs::read_to_string(path)?,
        "pdf" => read_pdf(path, config)?,
        _ => anyhow::bail!("Unsupported file format: {}", ext),
    };

    if text.trim().is_empty() {
        anyhow::bail!("No text found in {}", path.display());
    }

    debug!("Read {} characters from {}", text.len(), path.display());
    Ok(text)
}

fn read_pdf(path: &Path, config: &StmtxConfig) -> anyhow::Result<String> {
    let data = fs::read(path)?;
    let content = PdfExtractor::read(&data, config.pdf.min_text_length)?;

    debug!("PDF has {} pages, type {:?}", content.page_count, content.pdf_type);

    if content.pdf_type == PdfType::Empty {
        anyhow::bail!(
            "PDF {} has no extractable text; scanned statements need OCR first",
            path.display()
        );
    }
    Ok(content.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("a.txt")));
        assert!(is_supported(Path::new("a.PDF")));
        assert!(!is_supported(Path::new("a.png")));
        assert!(!is_supported(Path::new("README")));
    }

    #[test]
    fn test_read_text_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.txt");
        fs::write(&path, "Securities Statement").unwrap();

        let text = read_document(&path, &StmtxConfig::default()).unwrap();
        assert_eq!(text, "Securities Statement");
    }

    #[test]
    fn test_read_rejects_unknown_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("s.png");
        fs::write(&image, "x").unwrap();
        assert!(read_document(&image, &StmtxConfig::default()).is_err());

        let empty = dir.path().join("e.txt");
        fs::write(&empty, "  \n").unwrap();
        assert!(read_document(&empty, &StmtxConfig::default()).is_err());
    }
}
