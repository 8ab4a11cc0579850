//! Compiled statement templates.
//!
//! A [`Template`] is built from a [`TemplateSpec`] once, at load time. All
//! regexes are compiled and every rule is checked against its field type
//! here, so extraction never meets a malformed template.

mod builtin;
mod loader;

pub use builtin::{builtin_templates, GENERIC_BANK_TEMPLATE};
pub use loader::{load_dir, load_file, parse_str, TemplateFormat};

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::error::TemplateError;
use crate::models::template::{FieldSpec, FieldType, MarkerSpec, TemplateSpec};
use crate::rules::{ExtractionMatch, FieldExtractor, ValidationRule};

/// Options applied while compiling templates.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Compiled size limit for each regex, in bytes.
    pub regex_size_limit: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { regex_size_limit: 1 << 20 }
    }
}

/// A compiled, immutable template.
#[derive(Debug, Clone)]
pub struct Template {
    spec: TemplateSpec,
    fields: Vec<Field>,
    header: Vec<LayoutMarker>,
    footer: Vec<LayoutMarker>,
}

impl Template {
    /// Compile a template with default options.
    pub fn from_spec(spec: TemplateSpec) -> Result<Self, TemplateError> {
        Self::compile(spec, &CompileOptions::default())
    }

    /// Compile a template.
    pub fn compile(spec: TemplateSpec, options: &CompileOptions) -> Result<Self, TemplateError> {
        if spec.name.trim().is_empty() {
            return Err(TemplateError::EmptyAttribute("name"));
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(spec.fields.len());
        for field_spec in &spec.fields {
            if !seen.insert(field_spec.name.as_str()) {
                return Err(TemplateError::DuplicateField(field_spec.name.clone()));
            }
            fields.push(Field::compile(field_spec, options)?);
        }

        let header = compile_markers(&spec.layout_markers.header, "header", options)?;
        let footer = compile_markers(&spec.layout_markers.footer, "footer", options)?;

        Ok(Self { spec, fields, header, footer })
    }

    /// Parse and compile a YAML template with default options.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, TemplateError> {
        parse_str(yaml, TemplateFormat::Yaml, &CompileOptions::default())
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn institution(&self) -> &str {
        &self.spec.institution
    }

    pub fn document_type(&self) -> &str {
        &self.spec.document_type
    }

    pub fn sample_identifiers(&self) -> &[String] {
        &self.spec.sample_identifiers
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The configuration this template was compiled from.
    pub fn spec(&self) -> &TemplateSpec {
        &self.spec
    }

    /// Total number of header and footer markers.
    pub fn marker_count(&self) -> usize {
        self.header.len() + self.footer.len()
    }

    /// Number of header and footer markers present in the text.
    pub fn marker_score(&self, text: &str) -> usize {
        self.score_with(text, &text.to_lowercase())
    }

    /// Marker score with a lower-cased copy of the text supplied by the caller.
    pub(crate) fn score_with(&self, text: &str, lowered: &str) -> usize {
        self.header
            .iter()
            .chain(self.footer.iter())
            .filter(|m| m.is_present(text, lowered))
            .count()
    }
}

fn compile_markers(
    specs: &[MarkerSpec],
    section: &str,
    options: &CompileOptions,
) -> Result<Vec<LayoutMarker>, TemplateError> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| match spec {
            MarkerSpec::Literal(text) => Ok(LayoutMarker::Literal(text.to_lowercase())),
            MarkerSpec::Regex { regex } => RegexBuilder::new(regex)
                .size_limit(options.regex_size_limit)
                .build()
                .map(LayoutMarker::Pattern)
                .map_err(|source| TemplateError::InvalidRegex {
                    context: format!("{} marker #{}", section, i),
                    source,
                }),
        })
        .collect()
}

/// A compiled layout marker.
#[derive(Debug, Clone)]
pub enum LayoutMarker {
    /// Lower-cased literal, matched against lower-cased text.
    Literal(String),
    /// Regex searched in the original text.
    Pattern(Regex),
}

impl LayoutMarker {
    fn is_present(&self, text: &str, lowered: &str) -> bool {
        match self {
            Self::Literal(needle) => !needle.is_empty() && lowered.contains(needle.as_str()),
            Self::Pattern(regex) => regex.is_match(text),
        }
    }
}

/// A compiled field definition.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    patterns: Vec<Regex>,
    rules: Vec<ValidationRule>,
}

impl Field {
    fn compile(spec: &FieldSpec, options: &CompileOptions) -> Result<Self, TemplateError> {
        if spec.name.trim().is_empty() {
            return Err(TemplateError::EmptyAttribute("field name"));
        }
        if spec.patterns.is_empty() {
            return Err(TemplateError::NoPatterns(spec.name.clone()));
        }

        let patterns = spec
            .patterns
            .iter()
            .enumerate()
            .map(|(index, pattern)| {
                RegexBuilder::new(pattern)
                    .size_limit(options.regex_size_limit)
                    .build()
                    .map_err(|source| TemplateError::InvalidPattern {
                        field: spec.name.clone(),
                        index,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rules = spec
            .validation_rules
            .iter()
            .map(|rule| {
                ValidationRule::compile(rule, &spec.name, spec.field_type, options.regex_size_limit)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: spec.name.clone(),
            field_type: spec.field_type,
            required: spec.required,
            patterns,
            rules,
        })
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    /// Confidence assigned to a match from the pattern at `index`.
    pub fn pattern_confidence(index: usize) -> f32 {
        (0.95 - 0.1 * index as f32).max(0.5)
    }

    /// Non-empty captures of one pattern, in text order.
    fn matches_of<'a>(
        &'a self,
        index: usize,
        text: &'a str,
    ) -> impl Iterator<Item = ExtractionMatch<String>> + 'a {
        self.patterns[index].captures_iter(text).filter_map(move |caps| {
            let whole = caps.get(0)?;
            let m = caps.name("value").or_else(|| caps.get(1)).unwrap_or(whole);

            let raw = m.as_str();
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }

            let start = m.start() + (raw.len() - raw.trim_start().len());
            let end = start + trimmed.len();
            Some(
                ExtractionMatch::new(trimmed.to_string(), Self::pattern_confidence(index), whole.as_str())
                    .with_position(start, end)
                    .with_pattern(index),
            )
        })
    }
}

impl FieldExtractor for Field {
    type Output = ExtractionMatch<String>;

    /// First non-empty capture of the first pattern that produces one.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        (0..self.patterns.len()).find_map(|index| self.matches_of(index, text).next())
    }

    /// Every capture of every pattern, grouped by pattern order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        (0..self.patterns.len())
            .flat_map(|index| self.matches_of(index, text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn template(yaml: &str) -> Result<Template, TemplateError> {
        Template::from_yaml_str(yaml)
    }

    #[test]
    fn test_compile_generic_template() {
        let t = template(GENERIC_BANK_TEMPLATE).unwrap();
        assert_eq!(t.name(), "generic_bank_template");
        assert_eq!(t.institution(), "Generic Bank");
        assert!(t.field("isin").unwrap().required);
        assert!(t.marker_count() >= 2);
    }

    #[test]
    fn test_bad_regex_fails_at_load() {
        let err = template(
            r#"
name: broken
fields:
  - name: isin
    patterns: ['ISIN: ([A-Z']
"#,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidPattern { ref field, index: 0, .. } if field == "isin"));
    }

    #[test]
    fn test_bad_rule_regex_fails_at_load() {
        let err = template(
            r#"
name: broken
fields:
  - name: isin
    patterns: ['(\w+)']
    validation_rules:
      - type: regex
        pattern: '[A-Z'
"#,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidRegex { ref context, .. } if context.contains("isin")));
    }

    #[test]
    fn test_bad_marker_regex_fails_at_load() {
        let err = template(
            r#"
name: broken
fields:
  - name: isin
    patterns: ['(\w+)']
layout_markers:
  footer:
    - Portfolio Summary
    - regex: 'Page (\d+'
"#,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidRegex { ref context, .. } if context.contains("footer marker #1")));
    }

    #[test]
    fn test_unknown_rule_type_fails_at_load() {
        let err = template(
            r#"
name: broken
fields:
  - name: isin
    patterns: ['(\w+)']
    validation_rules:
      - type: luhn
"#,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::Yaml(_)));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = template(
            r#"
name: dup
fields:
  - name: a
    patterns: ['a']
  - name: a
    patterns: ['b']
"#,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateField(ref f) if f == "a"));
    }

    #[test]
    fn test_field_without_patterns_rejected() {
        let err = template("name: t\nfields:\n  - name: a\n    patterns: []\n").unwrap_err();
        assert!(matches!(err, TemplateError::NoPatterns(_)));
    }

    #[test]
    fn test_pattern_order_first_match_wins() {
        let t = template(
            r#"
name: order
fields:
  - name: total
    patterns:
      - 'Grand Total: (\S+)'
      - 'Total: (\S+)'
"#,
        )
        .unwrap();
        let field = t.field("total").unwrap();

        let m = field.extract("Total: 10\nGrand Total: 20").unwrap();
        assert_eq!(m.value, "20");
        assert_eq!(m.pattern_index, Some(0));

        let m = field.extract("Total: 10").unwrap();
        assert_eq!(m.value, "10");
        assert_eq!(m.pattern_index, Some(1));
        assert!(m.confidence < Field::pattern_confidence(0));
    }

    #[test]
    fn test_capture_selection() {
        let t = template(
            r#"
name: caps
fields:
  - name: named
    patterns: ['(ID)\s*(?P<value>\d+)']
  - name: whole
    patterns: ['[A-Z]{3}\d{3}']
"#,
        )
        .unwrap();

        let named = t.field("named").unwrap().extract("ID 42").unwrap();
        assert_eq!(named.value, "42");
        assert_eq!(named.position, Some((3, 5)));

        let whole = t.field("whole").unwrap().extract("ref ABC123 end").unwrap();
        assert_eq!(whole.value, "ABC123");
    }

    #[test]
    fn test_empty_capture_skipped() {
        let t = template(
            r#"
name: blank
fields:
  - name: name
    patterns: ['Name:([ \t]*)\n', 'Holder: (\w+)']
"#,
        )
        .unwrap();

        let m = t.field("name").unwrap().extract("Name:   \nHolder: Alice").unwrap();
        assert_eq!(m.value, "Alice");
        assert_eq!(m.pattern_index, Some(1));
    }

    #[test]
    fn test_marker_score() {
        let t = template(
            r#"
name: markers
fields:
  - name: a
    patterns: ['a']
layout_markers:
  header: ['Securities Statement']
  footer: ['Portfolio Summary', { regex: 'Page \d+ of \d+' }]
"#,
        )
        .unwrap();

        assert_eq!(t.marker_score("SECURITIES STATEMENT\n...\nPage 1 of 3"), 2);
        assert_eq!(t.marker_score("nothing relevant"), 0);
    }
}
