//! Templates embedded in the library for use without a template directory.

use super::{parse_str, CompileOptions, Template, TemplateFormat};
use crate::error::TemplateError;

/// Generic securities statement template (YAML).
pub static GENERIC_BANK_TEMPLATE: &str = include_str!("../../../../templates/generic_bank.yaml");

/// Compile all embedded templates.
pub fn builtin_templates(options: &CompileOptions) -> Result<Vec<Template>, TemplateError> {
    Ok(vec![parse_str(GENERIC_BANK_TEMPLATE, TemplateFormat::Yaml, options)?])
}
