//! Common regex patterns for statement parsing.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // ISIN: country code, 9 alphanumerics, numeric check digit
    pub static ref ISIN_PATTERN: Regex = Regex::new(
        r"\b([A-Z]{2}[A-Z0-9]{9}[0-9])\b"
    ).unwrap();

    pub static ref ISIN_EXACT: Regex = Regex::new(
        r"^[A-Z]{2}[A-Z0-9]{9}[0-9]$"
    ).unwrap();

    // Numeric token in a statement row: 1,234.56 / (1'000) / -5 / 12,5
    pub static ref NUMBER_TOKEN: Regex = Regex::new(
        r"\(?[-\u{2212}]?\d(?:[\d,.'\u{00a0}]*\d)?\)?"
    ).unwrap();

    // Security name directly preceding an ISIN on the same line
    pub static ref NAME_BEFORE_ISIN: Regex = Regex::new(
        r"([A-Za-z][A-Za-z0-9 .,&'\-]{2,})[\s:|]*$"
    ).unwrap();

    // Dates
    pub static ref DATE_ISO: Regex = Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})$"
    ).unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(
        r"^(\d{1,2})[./\-](\d{1,2})[./\-](\d{4})$"
    ).unwrap();

    pub static ref DATE_LONG_DMY: Regex = Regex::new(
        r"(?i)^(\d{1,2})\.?\s+([a-z]+)\.?,?\s+(\d{4})$"
    ).unwrap();

    pub static ref DATE_LONG_MDY: Regex = Regex::new(
        r"(?i)^([a-z]+)\.?\s+(\d{1,2}),?\s+(\d{4})$"
    ).unwrap();
}
