//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for stmtx.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StmtxConfig {
    /// Template loading and selection.
    pub templates: TemplatesConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Holdings scan configuration.
    pub holdings: HoldingsConfig,

    /// PDF text extraction configuration.
    pub pdf: PdfConfig,
}

/// Template loading and selection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Directory of `*.yaml` / `*.json` template files.
    pub dir: Option<PathBuf>,

    /// Register the embedded generic bank template.
    pub include_builtin: bool,

    /// Minimum number of layout markers a template must match to be selected.
    pub min_marker_matches: usize,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: None,
            include_builtin: true,
            min_marker_matches: 1,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Compiled size limit for every template regex, in bytes.
    pub regex_size_limit: usize,

    /// Results below this confidence are handed to the fallback strategy.
    pub fallback_confidence: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            regex_size_limit: 1 << 20,
            fallback_confidence: 0.6,
        }
    }
}

/// Holdings scan configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldingsConfig {
    /// Bytes of context read on each side of an ISIN.
    pub context_window: usize,

    /// Relative price spread above which prices are flagged (0.05 = 5%).
    pub price_tolerance: f64,
}

impl Default for HoldingsConfig {
    fn default() -> Self {
        Self {
            context_window: 50,
            price_tolerance: 0.05,
        }
    }
}

/// PDF text extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum text length to consider a PDF as text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { min_text_length: 50 }
    }
}

impl StmtxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: StmtxConfig =
            serde_json::from_str(r#"{"templates": {"min_marker_matches": 2}}"#).unwrap();
        assert_eq!(config.templates.min_marker_matches, 2);
        assert!(config.templates.include_builtin);
        assert_eq!(config.holdings.context_window, 50);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = StmtxConfig::default();
        config.extraction.fallback_confidence = 0.8;
        config.save(&path).unwrap();

        assert_eq!(StmtxConfig::from_file(&path).unwrap(), config);
    }
}
