//! Compiled validation rules and type coercion.

use regex::{Regex, RegexBuilder};

use super::dates::parse_date;
use super::isin::{is_isin_format, validate_isin};
use super::numbers::{parse_decimal, parse_float, parse_integer};
use crate::error::{FieldError, TemplateError};
use crate::models::extraction::FieldValue;
use crate::models::template::{FieldType, RuleSpec};

/// A validation rule ready to run.
#[derive(Debug, Clone)]
pub enum ValidationRule {
    /// Raw captured string must fully match.
    Regex { pattern: String, regex: Regex },
    /// Inclusive numeric bounds.
    Range { min: Option<f64>, max: Option<f64> },
    /// ISIN format and check digit.
    Isin,
}

impl ValidationRule {
    /// Compile a rule for a field, rejecting rules that cannot apply to it.
    pub fn compile(
        spec: &RuleSpec,
        field: &str,
        field_type: FieldType,
        size_limit: usize,
    ) -> Result<Self, TemplateError> {
        match spec {
            RuleSpec::Regex { pattern } => {
                let regex = RegexBuilder::new(&format!("^(?:{})$", pattern))
                    .size_limit(size_limit)
                    .build()
                    .map_err(|source| TemplateError::InvalidRegex {
                        context: format!("regex rule of field {}", field),
                        source,
                    })?;
                Ok(Self::Regex { pattern: pattern.clone(), regex })
            }
            RuleSpec::Range { min, max } => {
                if !field_type.is_numeric() {
                    return Err(TemplateError::RuleTypeMismatch {
                        field: field.to_string(),
                        field_type: field_type.to_string(),
                        rule: "range".to_string(),
                    });
                }
                match (min, max) {
                    (None, None) => Err(TemplateError::InvalidRange {
                        field: field.to_string(),
                        reason: "at least one of min or max is required".to_string(),
                    }),
                    (Some(lo), Some(hi)) if lo > hi => Err(TemplateError::InvalidRange {
                        field: field.to_string(),
                        reason: format!("min {} is greater than max {}", lo, hi),
                    }),
                    _ => Ok(Self::Range { min: *min, max: *max }),
                }
            }
            RuleSpec::Isin => Ok(Self::Isin),
        }
    }

    /// Rule kind as written in template files.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Regex { .. } => "regex",
            Self::Range { .. } => "range",
            Self::Isin => "isin",
        }
    }

    /// Check a captured value.
    ///
    /// `value` is the coerced value; range rules pass when it is absent
    /// because the coercion failure is already recorded.
    pub fn check(&self, raw: &str, value: Option<&FieldValue>) -> Result<(), FieldError> {
        match self {
            Self::Regex { pattern, regex } => {
                if regex.is_match(raw) {
                    Ok(())
                } else {
                    Err(self.failure(format!("{:?} does not match {}", raw, pattern)))
                }
            }
            Self::Range { min, max } => {
                let Some(n) = value.and_then(FieldValue::as_f64) else {
                    return Ok(());
                };
                if let Some(lo) = min {
                    if n < *lo {
                        return Err(self.failure(format!("{} is below minimum {}", n, lo)));
                    }
                }
                if let Some(hi) = max {
                    if n > *hi {
                        return Err(self.failure(format!("{} is above maximum {}", n, hi)));
                    }
                }
                Ok(())
            }
            Self::Isin => {
                if !is_isin_format(raw) {
                    Err(self.failure(format!("{:?} is not shaped like an ISIN", raw)))
                } else if !validate_isin(raw) {
                    Err(self.failure(format!("{} has an invalid check digit", raw)))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn failure(&self, reason: String) -> FieldError {
        FieldError::Rule {
            rule: self.kind().to_string(),
            reason,
        }
    }
}

/// Convert captured text to a typed value.
pub fn coerce(field_type: FieldType, raw: &str) -> Result<FieldValue, FieldError> {
    let value = match field_type {
        FieldType::String => Some(FieldValue::String(raw.to_string())),
        FieldType::Float => parse_float(raw).map(FieldValue::Float),
        FieldType::Integer => parse_integer(raw).map(FieldValue::Integer),
        FieldType::Decimal => parse_decimal(raw).map(FieldValue::Decimal),
        FieldType::Date => parse_date(raw).map(FieldValue::Date),
    };

    value.ok_or_else(|| FieldError::Coercion {
        raw: raw.to_string(),
        target: field_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LIMIT: usize = 1 << 20;

    fn range(min: Option<f64>, max: Option<f64>) -> ValidationRule {
        ValidationRule::compile(&RuleSpec::Range { min, max }, "quantity", FieldType::Float, LIMIT)
            .unwrap()
    }

    #[test]
    fn test_regex_rule_is_anchored() {
        let rule = ValidationRule::compile(
            &RuleSpec::Regex { pattern: "[A-Z]{2}[A-Z0-9]{10}".into() },
            "isin",
            FieldType::String,
            LIMIT,
        )
        .unwrap();

        assert!(rule.check("US0378331005", None).is_ok());
        assert!(rule.check("xUS0378331005", None).is_err());
        assert!(rule.check("US0378331005 ", None).is_err());
    }

    #[test]
    fn test_range_rule() {
        let rule = range(Some(0.0), None);
        assert!(rule.check("100", Some(&FieldValue::Float(100.0))).is_ok());

        let err = rule.check("-5", Some(&FieldValue::Float(-5.0))).unwrap_err();
        assert!(matches!(err, FieldError::Rule { ref rule, .. } if rule == "range"));

        let bounded = range(Some(1.0), Some(10.0));
        assert!(bounded.check("11", Some(&FieldValue::Integer(11))).is_err());
        assert!(bounded.check("10", Some(&FieldValue::Integer(10))).is_ok());
    }

    #[test]
    fn test_range_skips_missing_value() {
        assert!(range(Some(0.0), None).check("abc", None).is_ok());
    }

    #[test]
    fn test_range_on_string_field_rejected() {
        let err = ValidationRule::compile(
            &RuleSpec::Range { min: Some(0.0), max: None },
            "name",
            FieldType::String,
            LIMIT,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::RuleTypeMismatch { .. }));
    }

    #[test]
    fn test_range_bounds_checked() {
        let spec = RuleSpec::Range { min: Some(5.0), max: Some(1.0) };
        assert!(ValidationRule::compile(&spec, "q", FieldType::Float, LIMIT).is_err());

        let spec = RuleSpec::Range { min: None, max: None };
        assert!(ValidationRule::compile(&spec, "q", FieldType::Float, LIMIT).is_err());
    }

    #[test]
    fn test_isin_rule() {
        let rule = ValidationRule::Isin;
        assert!(rule.check("US0378331005", None).is_ok());
        assert!(rule.check("US0378331006", None).is_err());
        assert!(rule.check("APPLE", None).is_err());
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce(FieldType::Float, "1,234.56"), Ok(FieldValue::Float(1234.56)));
        assert_eq!(coerce(FieldType::Integer, "1,000"), Ok(FieldValue::Integer(1000)));
        assert_eq!(
            coerce(FieldType::String, "Apple Inc."),
            Ok(FieldValue::String("Apple Inc.".into()))
        );
        assert_eq!(
            coerce(FieldType::Float, "n/a"),
            Err(FieldError::Coercion { raw: "n/a".into(), target: "float".into() })
        );
    }
}
