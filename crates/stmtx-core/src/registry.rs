//! Template registry and layout-marker based template selection.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{RegistryError, StmtxError};
use crate::models::config::StmtxConfig;
use crate::template::{builtin_templates, load_dir, CompileOptions, Template};

/// Marker score of one template against a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateScore {
    pub template: String,
    pub score: usize,
    pub markers: usize,
}

/// Read-only index of compiled templates.
///
/// Registration order is kept; it breaks ties during selection.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<Arc<Template>>,
    by_name: HashMap<String, usize>,
    min_marker_matches: usize,
}

impl TemplateRegistry {
    /// Create an empty registry with a marker threshold of 1.
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
            by_name: HashMap::new(),
            min_marker_matches: 1,
        }
    }

    /// Registry holding the embedded templates.
    pub fn with_builtin() -> Result<Self, StmtxError> {
        let mut registry = Self::new();
        for template in builtin_templates(&CompileOptions::default())? {
            registry.register(template)?;
        }
        Ok(registry)
    }

    /// Build a registry from configuration: embedded templates first (when
    /// enabled), then the template directory.
    pub fn from_config(config: &StmtxConfig) -> Result<Self, StmtxError> {
        let options = CompileOptions {
            regex_size_limit: config.extraction.regex_size_limit,
        };

        let mut registry = Self::new().with_min_marker_matches(config.templates.min_marker_matches);

        if config.templates.include_builtin {
            for template in builtin_templates(&options)? {
                registry.register(template)?;
            }
        }

        if let Some(dir) = &config.templates.dir {
            registry.load_dir(dir, &options)?;
        }

        info!("Template registry ready with {} templates", registry.len());
        Ok(registry)
    }

    /// Set the minimum number of markers a template must match. A template
    /// with no matching marker is never selected, so values below 1 act as 1.
    pub fn with_min_marker_matches(mut self, min: usize) -> Self {
        self.min_marker_matches = min.max(1);
        self
    }

    pub fn min_marker_matches(&self) -> usize {
        self.min_marker_matches
    }

    /// Add a template. Names must be unique.
    pub fn register(&mut self, template: Template) -> Result<(), RegistryError> {
        if self.by_name.contains_key(template.name()) {
            return Err(RegistryError::DuplicateTemplate(template.name().to_string()));
        }

        debug!("Registered template {}", template.name());
        self.by_name.insert(template.name().to_string(), self.templates.len());
        self.templates.push(Arc::new(template));
        Ok(())
    }

    /// Load and register every template file in a directory. Nothing is
    /// registered unless every file loads and every name is new.
    pub fn load_dir(&mut self, dir: &Path, options: &CompileOptions) -> Result<usize, StmtxError> {
        let templates = load_dir(dir, options)?;

        let mut seen = HashSet::new();
        for template in &templates {
            if self.by_name.contains_key(template.name()) || !seen.insert(template.name()) {
                return Err(RegistryError::DuplicateTemplate(template.name().to_string()).into());
            }
        }

        let count = templates.len();
        for template in templates {
            self.register(template)?;
        }
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Template>> {
        self.by_name.get(name).map(|&i| &self.templates[i])
    }

    /// First registered template for an institution (case-insensitive).
    pub fn by_institution(&self, institution: &str) -> Option<&Arc<Template>> {
        let wanted = institution.trim().to_lowercase();
        self.templates
            .iter()
            .find(|t| t.institution().to_lowercase() == wanted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Template>> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Marker scores of every template, in registration order.
    pub fn rank(&self, text: &str) -> Vec<TemplateScore> {
        let lowered = text.to_lowercase();
        self.templates
            .iter()
            .map(|t| TemplateScore {
                template: t.name().to_string(),
                score: t.score_with(text, &lowered),
                markers: t.marker_count(),
            })
            .collect()
    }

    /// Best-scoring template at or above the threshold. Ties go to the
    /// template registered first.
    pub fn select_template(&self, text: &str) -> Option<&Arc<Template>> {
        self.best_match(text).0
    }

    /// Like [`select_template`](Self::select_template), but reports why
    /// nothing was selected.
    pub fn require_template(&self, text: &str) -> Result<&Arc<Template>, RegistryError> {
        match self.best_match(text) {
            (Some(template), _) => Ok(template),
            (None, best_score) => Err(RegistryError::NoTemplateMatched {
                best_score,
                threshold: self.min_marker_matches,
            }),
        }
    }

    fn best_match(&self, text: &str) -> (Option<&Arc<Template>>, usize) {
        let mut best: Option<(usize, usize)> = None;

        for (index, score) in self.rank(text).iter().map(|s| s.score).enumerate() {
            debug!("Template {} scored {}", self.templates[index].name(), score);
            // Strictly greater keeps the earliest template on ties
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((index, score));
            }
        }

        match best {
            Some((index, score)) if score >= self.min_marker_matches => {
                debug!("Selected template {} (score {})", self.templates[index].name(), score);
                (Some(&self.templates[index]), score)
            }
            Some((_, score)) => (None, score),
            None => (None, 0),
        }
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
