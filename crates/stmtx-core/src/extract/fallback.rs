//! Request context and the pluggable fallback extractor.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::FallbackError;
use crate::template::Template;

/// Per-document request data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionContext {
    /// Identifier used in logs and summaries, usually the file name.
    pub document_id: String,
    /// Template to use instead of marker-based selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Institution whose template should be preferred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
}

impl ExtractionContext {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ..Self::default()
        }
    }

    pub fn with_template(mut self, name: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self
    }

    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }
}

/// Secondary extractor consulted when template extraction falls short,
/// typically backed by a language model.
pub trait FallbackStrategy: Send + Sync {
    /// Name used in logs and warnings.
    fn name(&self) -> &str;

    /// Raw string values keyed by field name.
    ///
    /// `template` is `None` when no template matched the document.
    fn extract(
        &self,
        ctx: &ExtractionContext,
        text: &str,
        template: Option<&Template>,
    ) -> Result<HashMap<String, String>, FallbackError>;
}
