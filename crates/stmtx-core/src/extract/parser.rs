//! Template-driven statement parser.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::models::extraction::{DocumentStatus, ExtractionResult, FieldOutcome, ValueSource};
use crate::rules::{coerce, ExtractionMatch, FieldExtractor};
use crate::template::{Field, Template};

use super::StatementParser;

/// Parser that applies a template's field patterns and rules.
///
/// Stateless: one parser can serve any number of templates and threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateParser;

impl TemplateParser {
    pub fn new() -> Self {
        Self
    }

    /// Coerce and validate one captured value.
    ///
    /// Every rule runs, so all failures are reported, not only the first.
    pub fn evaluate(field: &Field, m: ExtractionMatch<String>, source: ValueSource) -> FieldOutcome {
        let mut errors = Vec::new();

        let value = match coerce(field.field_type, &m.value) {
            Ok(value) => Some(value),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        for rule in field.rules() {
            if let Err(e) = rule.check(&m.value, value.as_ref()) {
                errors.push(e);
            }
        }

        let valid = errors.is_empty();
        debug!(
            "Field {} = {:?} (pattern {:?}, valid: {})",
            field.name, m.value, m.pattern_index, valid
        );

        FieldOutcome {
            name: field.name.clone(),
            field_type: field.field_type,
            raw: m.value,
            value,
            valid,
            confidence: if valid { m.confidence } else { 0.0 },
            pattern_index: m.pattern_index,
            position: m.position,
            errors,
            source,
        }
    }

    /// Assemble the result from field outcomes: order them by declaration,
    /// derive missing fields, status and confidence.
    pub(crate) fn finalize(
        template: &Template,
        mut fields: Vec<FieldOutcome>,
        mut warnings: Vec<String>,
        start: Instant,
    ) -> ExtractionResult {
        let position_of = |name: &str| {
            template
                .fields()
                .iter()
                .position(|f| f.name == name)
                .unwrap_or(usize::MAX)
        };
        fields.sort_by_key(|f| position_of(&f.name));

        let mut missing = Vec::new();
        let mut invalid = Vec::new();

        for field in template.fields() {
            match fields.iter().find(|o| o.name == field.name) {
                None if field.required => {
                    warnings.push(format!("Missing required field {}", field.name));
                    missing.push(field.name.clone());
                }
                Some(outcome) if !outcome.valid => {
                    for e in &outcome.errors {
                        warnings.push(format!("Field {}: {}", field.name, e));
                    }
                    if field.required {
                        invalid.push(field.name.clone());
                    }
                }
                _ => {}
            }
        }

        let status = if missing.is_empty() && invalid.is_empty() {
            DocumentStatus::Complete
        } else {
            DocumentStatus::Incomplete {
                missing: missing.clone(),
                invalid,
            }
        };

        let declared = template.fields().len();
        let confidence = if declared == 0 {
            0.0
        } else {
            fields.iter().map(|f| f.confidence).sum::<f32>() / declared as f32
        };

        ExtractionResult {
            template: Some(template.name().to_string()),
            institution: template.institution().to_string(),
            document_type: template.document_type().to_string(),
            fields,
            missing,
            status,
            confidence,
            warnings,
            extracted_at: Utc::now(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

impl StatementParser for TemplateParser {
    fn parse(&self, template: &Template, text: &str) -> ExtractionResult {
        let start = Instant::now();

        info!(
            "Extracting {} fields with template {} from {} characters",
            template.fields().len(),
            template.name(),
            text.len()
        );

        let fields: Vec<FieldOutcome> = template
            .fields()
            .iter()
            .filter_map(|field| {
                field
                    .extract(text)
                    .map(|m| Self::evaluate(field, m, ValueSource::Template))
            })
            .collect();

        let result = Self::finalize(template, fields, Vec::new(), start);

        debug!(
            "Template {} extracted {} fields, complete: {}, confidence {:.2}",
            template.name(),
            result.fields.len(),
            result.is_complete(),
            result.confidence
        );

        result
    }
}
