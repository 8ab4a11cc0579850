//! Date coercion for statement fields.

use chrono::NaiveDate;

use super::patterns::{DATE_DMY, DATE_ISO, DATE_LONG_DMY, DATE_LONG_MDY};

/// Parse a statement date.
///
/// Accepted: `2024-01-31`, `31.01.2024`, `31/01/2024`, `31-01-2024`,
/// `31 January 2024`, `January 31, 2024` (month names may be abbreviated).
/// Numeric dates are day-first.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Some(caps) = DATE_ISO.captures(s) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = DATE_DMY.captures(s) {
        return ymd(&caps[3], &caps[2], &caps[1]);
    }

    if let Some(caps) = DATE_LONG_DMY.captures(s) {
        let month = month_to_number(&caps[2])?;
        return NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, caps[1].parse().ok()?);
    }

    if let Some(caps) = DATE_LONG_MDY.captures(s) {
        let month = month_to_number(&caps[1])?;
        return NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, caps[2].parse().ok()?);
    }

    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Convert an English month name or three-letter abbreviation to its number.
fn month_to_number(month: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june",
        "july", "august", "september", "october", "november", "december",
    ];

    let lower = month.to_lowercase();
    if lower.len() < 3 {
        return None;
    }

    MONTHS
        .iter()
        .position(|m| *m == lower || (lower.len() <= m.len() && m.starts_with(&lower)))
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_numeric_formats() {
        assert_eq!(parse_date("2024-01-31"), date(2024, 1, 31));
        assert_eq!(parse_date("31.01.2024"), date(2024, 1, 31));
        assert_eq!(parse_date("31/01/2024"), date(2024, 1, 31));
        assert_eq!(parse_date("05-03-2024"), date(2024, 3, 5));
    }

    #[test]
    fn test_long_formats() {
        assert_eq!(parse_date("31 January 2024"), date(2024, 1, 31));
        assert_eq!(parse_date("Dec 15, 2023"), date(2023, 12, 15));
        assert_eq!(parse_date("15 Sept 2023"), date(2023, 9, 15));
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("31 Smarch 2024"), None);
        assert_eq!(parse_date("yesterday"), None);
    }
}
