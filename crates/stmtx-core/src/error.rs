//! Error types for the stmtx-core library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the stmtx library.
#[derive(Error, Debug)]
pub enum StmtxError {
    /// Template loading or compilation error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Template registry error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// PDF processing error.
    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Fallback strategy error.
    #[error("fallback error: {0}")]
    Fallback(#[from] FallbackError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while loading or compiling a template.
///
/// All of these are raised at load time so a broken template never reaches
/// extraction.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The YAML document could not be parsed (includes unknown rule types).
    #[error("failed to parse template YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The JSON document could not be parsed (includes unknown rule types).
    #[error("failed to parse template JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A field pattern is not a valid regex.
    #[error("invalid pattern #{index} for field {field}: {source}")]
    InvalidPattern {
        field: String,
        index: usize,
        #[source]
        source: regex::Error,
    },

    /// A validation rule or layout marker regex is not valid.
    #[error("invalid regex in {context}: {source}")]
    InvalidRegex {
        context: String,
        #[source]
        source: regex::Error,
    },

    /// A field declares no patterns.
    #[error("field {0} has no patterns")]
    NoPatterns(String),

    /// The same field name appears twice.
    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    /// A rule is not applicable to the field it is attached to.
    #[error("rule {rule} is not valid for {field_type} field {field}")]
    RuleTypeMismatch {
        field: String,
        field_type: String,
        rule: String,
    },

    /// A range rule has no bounds or inverted bounds.
    #[error("invalid range for field {field}: {reason}")]
    InvalidRange { field: String, reason: String },

    /// A required template attribute is empty.
    #[error("template attribute {0} must not be empty")]
    EmptyAttribute(&'static str),

    /// File extension is neither YAML nor JSON.
    #[error("unsupported template file: {0}")]
    UnsupportedFormat(String),

    /// I/O error while reading a template file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to the template registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A template with this name is already registered.
    #[error("template already registered: {0}")]
    DuplicateTemplate(String),

    /// No template cleared the marker threshold.
    #[error("no template matched (best score {best_score}, threshold {threshold})")]
    NoTemplateMatched { best_score: usize, threshold: usize },

    /// An explicitly requested template is not registered.
    #[error("unknown template: {0}")]
    UnknownTemplate(String),
}

/// Errors related to PDF processing.
#[cfg(feature = "pdf")]
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors reported by a fallback strategy.
#[derive(Error, Debug)]
pub enum FallbackError {
    /// The strategy is not available (missing credentials, disabled).
    #[error("fallback {0} is unavailable")]
    Unavailable(String),

    /// The strategy ran but failed.
    #[error("fallback {name} failed: {reason}")]
    Failed { name: String, reason: String },
}

/// Field-level failure recorded in an extraction result.
///
/// These never abort extraction; they travel with the field outcome.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    /// The captured text could not be converted to the field type.
    #[error("cannot parse {raw:?} as {target}")]
    Coercion { raw: String, target: String },

    /// A validation rule rejected the value.
    #[error("{rule} rule failed: {reason}")]
    Rule { rule: String, reason: String },
}

/// Result type for the stmtx library.
pub type Result<T> = std::result::Result<T, StmtxError>;
