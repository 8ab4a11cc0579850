//! Rule building blocks: value coercion, validation rules, and ISIN handling.

pub mod dates;
pub mod isin;
pub mod numbers;
pub mod patterns;
pub mod validation;

pub use dates::parse_date;
pub use isin::{
    extract_isin, extract_isins, is_isin_format, isin_check_digit, validate_isin, IsinExtractor, IsinOccurrence,
};
pub use numbers::{normalize_number, parse_decimal, parse_float, parse_integer};
pub use validation::{coerce, ValidationRule};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A single match with its confidence and location.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Byte span in the source text.
    pub position: Option<(usize, usize)>,
    /// Index of the pattern that produced the match, for multi-pattern fields.
    pub pattern_index: Option<usize>,
    /// Full text matched by the pattern.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            pattern_index: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn with_pattern(mut self, index: usize) -> Self {
        self.pattern_index = Some(index);
        self
    }
}
