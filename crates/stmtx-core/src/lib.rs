//! Core library for template-driven statement field extraction.
//!
//! This crate provides:
//! - Declarative YAML/JSON templates compiled once into regexes and rules
//! - A template registry with layout-marker based selection
//! - Field extraction with type coercion and validation (regex, range, ISIN)
//! - A processing pipeline with a pluggable fallback extractor
//! - ISIN-anchored holdings scan and portfolio aggregation
//! - PDF text extraction (feature `pdf`)

pub mod error;
pub mod extract;
pub mod holdings;
pub mod models;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod registry;
pub mod rules;
pub mod template;

pub use error::{FallbackError, FieldError, RegistryError, Result, StmtxError, TemplateError};
pub use extract::{
    ExtractionContext, FallbackStrategy, StatementParser, StatementProcessor, TemplateParser,
};
pub use holdings::HoldingScanner;
pub use models::config::StmtxConfig;
pub use models::{
    DocumentStatus, ExtractionResult, FieldOutcome, FieldValue, Holding, PortfolioSummary,
    ValueSource,
};
#[cfg(feature = "pdf")]
pub use pdf::{PdfContent, PdfExtractor, PdfProcessor, PdfType};
#[cfg(feature = "pdf")]
pub use error::PdfError;
pub use registry::{TemplateRegistry, TemplateScore};
pub use rules::{validate_isin, isin_check_digit, extract_isins};
pub use template::{CompileOptions, Field, Template};
