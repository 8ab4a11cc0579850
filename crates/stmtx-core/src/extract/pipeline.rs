//! Statement processing pipeline: template choice, extraction, fallback.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::{ExtractionContext, FallbackStrategy, StatementParser, TemplateParser};
use crate::error::{RegistryError, StmtxError};
use crate::models::config::StmtxConfig;
use crate::models::extraction::{
    DocumentStatus, ExtractionResult, FieldOutcome, FieldValue, ValueSource,
};
use crate::models::template::FieldType;
use crate::registry::TemplateRegistry;
use crate::rules::ExtractionMatch;
use crate::template::Template;

/// Confidence given to values supplied by a fallback strategy.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Processes documents against a shared template registry.
pub struct StatementProcessor {
    registry: Arc<TemplateRegistry>,
    parser: TemplateParser,
    fallback: Option<Box<dyn FallbackStrategy>>,
    fallback_confidence: f32,
}

impl StatementProcessor {
    /// Create a processor without a fallback.
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        Self {
            registry,
            parser: TemplateParser::new(),
            fallback: None,
            fallback_confidence: 0.6,
        }
    }

    /// Create a processor with thresholds from configuration.
    pub fn from_config(registry: Arc<TemplateRegistry>, config: &StmtxConfig) -> Self {
        Self::new(registry).with_fallback_confidence(config.extraction.fallback_confidence)
    }

    /// Set the fallback strategy.
    pub fn with_fallback(mut self, fallback: Box<dyn FallbackStrategy>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Results below this confidence are passed to the fallback.
    pub fn with_fallback_confidence(mut self, confidence: f32) -> Self {
        self.fallback_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Extract one document.
    ///
    /// Errors only when no template applies and no fallback is set, when an
    /// explicit template name is unknown, or when the fallback fails for a
    /// document without a template.
    pub fn process(&self, ctx: &ExtractionContext, text: &str) -> Result<ExtractionResult, StmtxError> {
        let start = Instant::now();

        let template = match self.resolve_template(ctx, text) {
            Ok(template) => template,
            Err(RegistryError::NoTemplateMatched { best_score, threshold }) => {
                let Some(fallback) = &self.fallback else {
                    return Err(RegistryError::NoTemplateMatched { best_score, threshold }.into());
                };
                warn!(
                    "No template matched {} (best score {}), using fallback {}",
                    ctx.document_id,
                    best_score,
                    fallback.name()
                );
                return self.untemplated(fallback.as_ref(), ctx, text, start);
            }
            Err(e) => return Err(e.into()),
        };

        let mut result = self.parser.parse(template, text);

        if let Some(fallback) = &self.fallback {
            if !result.is_complete() || result.confidence < self.fallback_confidence {
                result = self.apply_fallback(fallback.as_ref(), template, ctx, text, result, start);
            }
        }

        result.processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Processed {} with {}: {} fields, complete: {}, confidence {:.2}",
            ctx.document_id,
            template.name(),
            result.fields.len(),
            result.is_complete(),
            result.confidence
        );

        Ok(result)
    }

    /// Explicit name, then institution hint, then layout markers.
    fn resolve_template(
        &self,
        ctx: &ExtractionContext,
        text: &str,
    ) -> Result<&Template, RegistryError> {
        if let Some(name) = &ctx.template {
            return self
                .registry
                .get(name)
                .map(|t| t.as_ref())
                .ok_or_else(|| RegistryError::UnknownTemplate(name.clone()));
        }

        if let Some(institution) = &ctx.institution {
            match self.registry.by_institution(institution) {
                Some(template) => {
                    debug!("Using template {} for institution {}", template.name(), institution);
                    return Ok(template.as_ref());
                }
                None => debug!("No template for institution {}, selecting by markers", institution),
            }
        }

        self.registry.require_template(text).map(|t| t.as_ref())
    }

    /// Fill missing and invalid fields from the fallback.
    fn apply_fallback(
        &self,
        fallback: &dyn FallbackStrategy,
        template: &Template,
        ctx: &ExtractionContext,
        text: &str,
        result: ExtractionResult,
        start: Instant,
    ) -> ExtractionResult {
        debug!(
            "Calling fallback {} for {} (complete: {}, confidence {:.2})",
            fallback.name(),
            ctx.document_id,
            result.is_complete(),
            result.confidence
        );

        let values = match fallback.extract(ctx, text, Some(template)) {
            Ok(values) => values,
            Err(e) => {
                warn!("Fallback {} failed for {}: {}", fallback.name(), ctx.document_id, e);
                let mut result = result;
                result.warnings.push(format!("Fallback {} failed: {}", fallback.name(), e));
                return result;
            }
        };

        let mut fields = result.fields;
        let mut filled = Vec::new();

        for field in template.fields() {
            let Some(raw) = values.get(&field.name).map(|v| v.trim()).filter(|v| !v.is_empty())
            else {
                continue;
            };

            let existing = fields.iter().position(|o| o.name == field.name);
            if existing.is_some_and(|i| fields[i].valid) {
                continue;
            }

            let m = ExtractionMatch::new(raw.to_string(), FALLBACK_CONFIDENCE, raw);
            let outcome = TemplateParser::evaluate(field, m, ValueSource::Fallback);

            match existing {
                None => fields.push(outcome),
                // Keep the template's failure unless the fallback value is better
                Some(i) if outcome.valid => fields[i] = outcome,
                Some(_) => continue,
            }
            filled.push(field.name.clone());
        }

        let mut warnings = Vec::new();
        if !filled.is_empty() {
            info!("Fallback {} supplied {}", fallback.name(), filled.join(", "));
            warnings.push(format!(
                "Fallback {} supplied fields: {}",
                fallback.name(),
                filled.join(", ")
            ));
        }

        TemplateParser::finalize(template, fields, warnings, start)
    }

    /// Result built only from fallback values, for documents no template fits.
    fn untemplated(
        &self,
        fallback: &dyn FallbackStrategy,
        ctx: &ExtractionContext,
        text: &str,
        start: Instant,
    ) -> Result<ExtractionResult, StmtxError> {
        let values: HashMap<String, String> = fallback.extract(ctx, text, None)?;

        let mut fields: Vec<FieldOutcome> = values
            .into_iter()
            .filter_map(|(name, raw)| {
                let raw = raw.trim().to_string();
                if raw.is_empty() {
                    return None;
                }
                Some(FieldOutcome {
                    name,
                    field_type: FieldType::String,
                    value: Some(FieldValue::String(raw.clone())),
                    raw,
                    valid: true,
                    confidence: FALLBACK_CONFIDENCE,
                    pattern_index: None,
                    position: None,
                    errors: Vec::new(),
                    source: ValueSource::Fallback,
                })
            })
            .collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));

        let confidence = if fields.is_empty() { 0.0 } else { FALLBACK_CONFIDENCE };

        info!(
            "Processed {} with fallback {}: {} fields",
            ctx.document_id,
            fallback.name(),
            fields.len()
        );

        Ok(ExtractionResult {
            template: None,
            institution: ctx.institution.clone().unwrap_or_default(),
            document_type: String::new(),
            fields,
            missing: Vec::new(),
            status: DocumentStatus::Complete,
            confidence,
            warnings: vec![format!("No template matched; values from fallback {}", fallback.name())],
            extracted_at: Utc::now(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
