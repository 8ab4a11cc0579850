//! ISIN (International Securities Identification Number) extraction and validation.

use super::patterns::{ISIN_EXACT, ISIN_PATTERN};
use super::{ExtractionMatch, FieldExtractor};

/// ISIN field extractor.
pub struct IsinExtractor {
    validate: bool,
}

impl IsinExtractor {
    /// Create a new ISIN extractor.
    pub fn new() -> Self {
        Self { validate: true }
    }

    /// Set whether to validate ISIN check digits.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

impl Default for IsinExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for IsinExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for m in ISIN_PATTERN.find_iter(text) {
            let isin = m.as_str();
            let valid = validate_isin(isin);

            if self.validate && !valid {
                continue;
            }

            let confidence = if valid { 0.95 } else { 0.6 };
            results.push(
                ExtractionMatch::new(isin.to_string(), confidence, isin)
                    .with_position(m.start(), m.end()),
            );
        }

        results
    }
}

/// Extract the first ISIN with a correct check digit.
pub fn extract_isin(text: &str) -> Option<String> {
    IsinExtractor::new().extract(text).map(|m| m.value)
}

/// An ISIN-shaped token found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsinOccurrence {
    pub isin: String,
    pub start: usize,
    pub end: usize,
    /// Whether the check digit is correct.
    pub valid: bool,
}

/// Every ISIN-shaped token in text order, whatever its check digit.
pub fn extract_isins(text: &str) -> Vec<IsinOccurrence> {
    ISIN_PATTERN
        .find_iter(text)
        .map(|m| IsinOccurrence {
            isin: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
            valid: validate_isin(m.as_str()),
        })
        .collect()
}

/// Whether the string has the ISIN shape: two letters, nine alphanumerics,
/// one digit.
pub fn is_isin_format(isin: &str) -> bool {
    ISIN_EXACT.is_match(isin)
}

/// Validate an ISIN including its check digit.
///
/// Algorithm:
/// 1. Replace letters with numbers (A=10, B=11, ..., Z=35)
/// 2. Run the Luhn checksum over the resulting digit string
pub fn validate_isin(isin: &str) -> bool {
    if !is_isin_format(isin) {
        return false;
    }

    match expand_digits(isin) {
        Some(digits) => luhn_sum(&digits, false) % 10 == 0,
        None => false,
    }
}

/// Compute the check digit for an 11-character ISIN payload.
pub fn isin_check_digit(payload: &str) -> Option<u32> {
    if payload.len() != 11 || !payload.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return None;
    }

    let digits = expand_digits(payload)?;
    // The check digit will sit to the right, so doubling starts at the last payload digit
    Some((10 - luhn_sum(&digits, true) % 10) % 10)
}

/// Expand letters to their two-digit values.
fn expand_digits(s: &str) -> Option<Vec<u32>> {
    let mut digits = Vec::with_capacity(s.len() * 2);
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c.to_digit(10)?);
        } else if c.is_ascii_uppercase() {
            let value = (c as u32) - ('A' as u32) + 10;
            digits.push(value / 10);
            digits.push(value % 10);
        } else {
            return None;
        }
    }
    Some(digits)
}

/// Luhn sum from the right. `double_rightmost` selects whether the rightmost
/// digit is doubled.
fn luhn_sum(digits: &[u32], double_rightmost: bool) -> u32 {
    digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            let doubled = (i % 2 == 0) == double_rightmost;
            if doubled {
                let d2 = d * 2;
                if d2 > 9 { d2 - 9 } else { d2 }
            } else {
                d
            }
        })
        .sum()
}
