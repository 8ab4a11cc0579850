//! Declarative template configuration as it appears in YAML/JSON files.
//!
//! These types are the serialized form only. They are compiled into
//! [`crate::template::Template`] before use, which is where regexes are
//! built and rules are checked against field types.

use serde::{Deserialize, Serialize};

/// A template file: one institution/document-type layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    /// Unique template name (registry key).
    pub name: String,

    /// Institution issuing the documents.
    #[serde(default)]
    pub institution: String,

    /// Document type, e.g. `statement`.
    #[serde(default)]
    pub document_type: String,

    /// Ordered field definitions.
    pub fields: Vec<FieldSpec>,

    /// Markers used to score how well a document fits this template.
    #[serde(default)]
    pub layout_markers: LayoutMarkersSpec,

    /// Free-form keywords describing documents of this kind.
    #[serde(default)]
    pub sample_identifiers: Vec<String>,
}

/// One extractable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name (unique within the template).
    pub name: String,

    /// Semantic type of the extracted value.
    #[serde(default)]
    pub field_type: FieldType,

    /// Whether the document is incomplete without this field.
    #[serde(default)]
    pub required: bool,

    /// Regex patterns, tried in order. First match wins.
    pub patterns: Vec<String>,

    /// Rules applied to the extracted value. All must pass.
    #[serde(default)]
    pub validation_rules: Vec<RuleSpec>,
}

/// Semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Raw text.
    #[default]
    String,
    /// Floating point number.
    Float,
    /// Whole number.
    Integer,
    /// Exact decimal amount.
    Decimal,
    /// Calendar date.
    Date,
}

impl FieldType {
    /// Whether range rules apply to this type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Float | Self::Integer | Self::Decimal)
    }

    /// Lower-case name as used in template files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Date => "date",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation rule as written in a template file.
///
/// Unknown `type` values are rejected by the deserializer, so a typo in a
/// rule fails when the template loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleSpec {
    /// The raw captured string must fully match the pattern.
    Regex { pattern: String },

    /// Inclusive numeric bounds.
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },

    /// ISIN format and check digit.
    Isin,
}

/// Header and footer markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutMarkersSpec {
    #[serde(default)]
    pub header: Vec<MarkerSpec>,

    #[serde(default)]
    pub footer: Vec<MarkerSpec>,
}

/// A layout marker: a literal substring or a regex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerSpec {
    /// Case-insensitive substring.
    Literal(String),
    /// Regex searched anywhere in the text.
    Regex { regex: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_applied() {
        let yaml = r#"
name: minimal
fields:
  - name: account
    patterns: ['Account (\d+)']
"#;
        let spec: TemplateSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.institution, "");
        assert_eq!(spec.fields[0].field_type, FieldType::String);
        assert!(!spec.fields[0].required);
        assert!(spec.fields[0].validation_rules.is_empty());
        assert!(spec.layout_markers.header.is_empty());
    }

    #[test]
    fn test_rule_variants() {
        let yaml = r#"
- type: regex
  pattern: '[A-Z]+'
- type: range
  min: 0
- type: isin
"#;
        let rules: Vec<RuleSpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            rules,
            vec![
                RuleSpec::Regex { pattern: "[A-Z]+".to_string() },
                RuleSpec::Range { min: Some(0.0), max: None },
                RuleSpec::Isin,
            ]
        );
    }

    #[test]
    fn test_unknown_rule_type_rejected() {
        let yaml = "- type: checksum\n  pattern: x\n";
        assert!(serde_yaml::from_str::<Vec<RuleSpec>>(yaml).is_err());
    }

    #[test]
    fn test_marker_forms() {
        let yaml = r#"
header: ['Securities Statement']
footer:
  - regex: 'Page \d+'
"#;
        let markers: LayoutMarkersSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(markers.header[0], MarkerSpec::Literal("Securities Statement".into()));
        assert_eq!(markers.footer[0], MarkerSpec::Regex { regex: r"Page \d+".into() });
    }
}
