//! Numeric coercion for statement amounts.
//!
//! Statements mix conventions (`1,234.56`, `1.234,56`, `1'234.56`,
//! `1 234,56`, `$ (1,000.00)`), so separators are resolved by position
//! rather than by locale.

use rust_decimal::Decimal;
use std::str::FromStr;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₪', '₹', '¤', '₣', '₽', '₩'];
const GROUP_SEPARATORS: &[char] = &[' ', '\'', '\u{00a0}', '\u{202f}', '\u{2009}'];

/// Normalize a formatted amount to a plain `-1234.56` string.
///
/// Currency symbols and codes are only stripped from the ends, so text
/// with letters in the middle is rejected.
pub fn normalize_number(s: &str) -> Option<String> {
    let is_noise = |c: char| c.is_whitespace() || c.is_alphabetic() || CURRENCY_SYMBOLS.contains(&c);

    let mut body = s.trim_matches(is_noise);
    let mut negative = false;

    // Accounting negatives: (1,234.56)
    if body.starts_with('(') && body.ends_with(')') && body.len() > 2 {
        negative = true;
        body = body[1..body.len() - 1].trim_matches(is_noise);
    }

    if let Some(rest) = body.strip_prefix(['-', '\u{2212}']) {
        negative = !negative;
        body = rest.trim_matches(is_noise);
    } else if let Some(rest) = body.strip_prefix('+') {
        body = rest.trim_matches(is_noise);
    } else if let Some(rest) = body.strip_suffix('-') {
        negative = !negative;
        body = rest.trim_matches(is_noise);
    }

    if body.is_empty()
        || !body
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '.' || GROUP_SEPARATORS.contains(&c))
    {
        return None;
    }

    let cleaned: String = body.chars().filter(|c| !GROUP_SEPARATORS.contains(c)).collect();
    let normalized = resolve_separators(&cleaned)?;

    let (int_part, frac_part) = match normalized.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (normalized.as_str(), None),
    };

    if frac_part.is_some_and(|f| f.is_empty()) || (int_part.is_empty() && frac_part.is_none()) {
        return None;
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let mut out = String::with_capacity(normalized.len() + 2);
    if negative {
        out.push('-');
    }
    out.push_str(int_part);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    Some(out)
}

/// Decide which of `,` and `.` is the decimal separator and drop the other.
fn resolve_separators(s: &str) -> Option<String> {
    let commas = s.matches(',').count();
    let dots = s.matches('.').count();

    let out = match (commas, dots) {
        (0, 0) => s.to_string(),
        (_, 0) => {
            // A single comma with exactly three digits after it groups thousands
            // (1,234); otherwise it is a decimal comma (12,5).
            if commas == 1 && !is_thousands_group(s, ',') {
                s.replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (0, _) => {
            if dots == 1 {
                s.to_string()
            } else {
                s.replace('.', "")
            }
        }
        _ => {
            // Both present: the last one is the decimal separator
            let comma_pos = s.rfind(',')?;
            let dot_pos = s.rfind('.')?;
            if comma_pos > dot_pos {
                if commas > 1 {
                    return None;
                }
                s.replace('.', "").replace(',', ".")
            } else {
                if dots > 1 {
                    return None;
                }
                s.replace(',', "")
            }
        }
    };

    Some(out)
}

fn is_thousands_group(s: &str, sep: char) -> bool {
    match s.split_once(sep) {
        Some((before, after)) => {
            !before.is_empty() && before.len() <= 3 && after.len() == 3
        }
        None => false,
    }
}

/// Parse a formatted amount as `f64`.
pub fn parse_float(s: &str) -> Option<f64> {
    normalize_number(s)?.parse().ok()
}

/// Parse a formatted amount as an exact decimal.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(&normalize_number(s)?).ok()
}

/// Parse a formatted whole number. A fractional part is rejected unless it is
/// all zeros.
pub fn parse_integer(s: &str) -> Option<i64> {
    let normalized = normalize_number(s)?;
    match normalized.split_once('.') {
        Some((int_part, frac)) if frac.chars().all(|c| c == '0') => int_part.parse().ok(),
        Some(_) => None,
        None => normalized.parse().ok(),
    }
}
