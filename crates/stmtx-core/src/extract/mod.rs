//! Field extraction: the template parser, fallback seam and processing pipeline.

mod fallback;
mod parser;
mod pipeline;

pub use fallback::{ExtractionContext, FallbackStrategy};
pub use parser::TemplateParser;
pub use pipeline::{StatementProcessor, FALLBACK_CONFIDENCE};

use crate::models::extraction::ExtractionResult;
use crate::template::Template;

/// Trait for statement parsers.
pub trait StatementParser {
    /// Apply a template to document text.
    ///
    /// Field-level failures are recorded in the result, never returned as
    /// errors.
    fn parse(&self, template: &Template, text: &str) -> ExtractionResult;
}
