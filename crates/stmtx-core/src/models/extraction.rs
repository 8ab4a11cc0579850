//! Extraction result data models.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::template::FieldType;
use crate::error::FieldError;

/// A typed field value. Serialized as `{"type": ..., "value": ...}` since
/// dates and decimals are written as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Date(NaiveDate),
}

impl FieldValue {
    /// Numeric view used by range rules.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Decimal(d) => d.to_f64(),
            Self::String(_) | Self::Date(_) => None,
        }
    }

    /// String view, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(v) => write!(f, "{}", v),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::Date(d) => write!(f, "{}", d),
        }
    }
}

/// Where a field value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Matched by a template pattern.
    #[default]
    Template,
    /// Supplied by a fallback strategy.
    Fallback,
}

/// Outcome for one matched field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOutcome {
    /// Field name.
    pub name: String,

    /// Declared field type.
    pub field_type: FieldType,

    /// Trimmed captured text.
    pub raw: String,

    /// Coerced value. Absent when coercion failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,

    /// Whether coercion and every validation rule succeeded.
    pub valid: bool,

    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,

    /// Index of the pattern that matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_index: Option<usize>,

    /// Byte span of the match in the source text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<(usize, usize)>,

    /// Coercion and rule failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,

    /// Origin of the value.
    #[serde(default)]
    pub source: ValueSource,
}

/// Overall document status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Every required field is present and valid.
    Complete,
    /// Some required fields are missing or invalid.
    Incomplete {
        missing: Vec<String>,
        invalid: Vec<String>,
    },
}

impl DocumentStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Result of applying one template to one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Template used, or `None` for a result built purely by a fallback.
    pub template: Option<String>,

    /// Institution of the template.
    #[serde(default)]
    pub institution: String,

    /// Document type of the template.
    #[serde(default)]
    pub document_type: String,

    /// Matched fields in declaration order.
    pub fields: Vec<FieldOutcome>,

    /// Required fields with no match.
    #[serde(default)]
    pub missing: Vec<String>,

    /// Overall status.
    pub status: DocumentStatus,

    /// Mean confidence over all declared fields.
    pub confidence: f32,

    /// Extraction warnings.
    #[serde(default)]
    pub warnings: Vec<String>,

    /// When the extraction ran.
    pub extracted_at: DateTime<Utc>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// Look up a matched field by name.
    pub fn field(&self, name: &str) -> Option<&FieldOutcome> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Coerced value of a field, if matched and coercible.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.field(name).and_then(|f| f.value.as_ref())
    }

    /// Field name to value map of all coerced values.
    pub fn values(&self) -> BTreeMap<String, FieldValue> {
        self.fields
            .iter()
            .filter_map(|f| f.value.clone().map(|v| (f.name.clone(), v)))
            .collect()
    }

    /// Names of matched fields that failed coercion or validation.
    pub fn invalid_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.valid)
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}
