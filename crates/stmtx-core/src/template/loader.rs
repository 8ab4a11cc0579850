//! Template file loading.

use std::path::Path;

use tracing::{debug, info};

use super::{CompileOptions, Template};
use crate::error::TemplateError;
use crate::models::template::TemplateSpec;

/// Serialization format of a template document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    Yaml,
    Json,
}

impl TemplateFormat {
    /// Format implied by a file extension (`yaml`, `yml`, `json`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse and compile a template document.
pub fn parse_str(
    content: &str,
    format: TemplateFormat,
    options: &CompileOptions,
) -> Result<Template, TemplateError> {
    let spec: TemplateSpec = match format {
        TemplateFormat::Yaml => serde_yaml::from_str(content)?,
        TemplateFormat::Json => serde_json::from_str(content)?,
    };
    Template::compile(spec, options)
}

/// Load one template file.
pub fn load_file(path: &Path, options: &CompileOptions) -> Result<Template, TemplateError> {
    let format = TemplateFormat::from_path(path)
        .ok_or_else(|| TemplateError::UnsupportedFormat(path.display().to_string()))?;

    let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let template = parse_str(&content, format, options)?;
    debug!("Loaded template {} from {}", template.name(), path.display());
    Ok(template)
}

/// Load every template file in a directory, ordered by file name.
///
/// Files with other extensions are ignored. The first broken file aborts
/// the load.
pub fn load_dir(dir: &Path, options: &CompileOptions) -> Result<Vec<Template>, TemplateError> {
    let io_err = |source| TemplateError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && TemplateFormat::from_path(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();

    let templates = paths
        .iter()
        .map(|p| load_file(p, options))
        .collect::<Result<Vec<_>, _>>()?;

    info!("Loaded {} templates from {}", templates.len(), dir.display());
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const YAML: &str = "name: yaml_t\nfields:\n  - name: a\n    patterns: ['a(\\d)']\n";
    const JSON: &str = r#"{"name": "json_t", "fields": [{"name": "a", "patterns": ["a(\\d)"]}]}"#;

    #[test]
    fn test_format_from_path() {
        assert_eq!(TemplateFormat::from_path(Path::new("t.yml")), Some(TemplateFormat::Yaml));
        assert_eq!(TemplateFormat::from_path(Path::new("t.JSON")), Some(TemplateFormat::Json));
        assert_eq!(TemplateFormat::from_path(Path::new("t.txt")), None);
    }

    #[test]
    fn test_load_dir_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.yaml"), YAML).unwrap();
        fs::write(dir.path().join("a.json"), JSON).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let templates = load_dir(dir.path(), &CompileOptions::default()).unwrap();
        let names: Vec<_> = templates.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["json_t", "yaml_t"]);
    }

    #[test]
    fn test_load_dir_fails_on_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.yaml"), YAML).unwrap();
        fs::write(
            dir.path().join("bad.yaml"),
            "name: bad\nfields:\n  - name: a\n    patterns: ['(']\n",
        )
        .unwrap();

        let err = load_dir(dir.path(), &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidPattern { .. }));
    }

    #[test]
    fn test_load_file_unsupported() {
        let err = load_file(Path::new("template.toml"), &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, TemplateError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_size_limit_applied() {
        let options = CompileOptions { regex_size_limit: 16 };
        let err = parse_str(YAML.replace("a(\\d)", "\\w{50}").as_str(), TemplateFormat::Yaml, &options)
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidPattern { .. }));
    }
}
