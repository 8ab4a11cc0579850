//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod document;
pub mod extract;
pub mod output;
pub mod templates;

use std::path::{Path, PathBuf};

use stmtx_core::models::config::StmtxConfig;
use stmtx_core::registry::TemplateRegistry;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stmtx")
        .join("config.json")
}

/// Load the configuration given with `--config`, else the file at
/// [`default_config_path`] when it exists, else the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<StmtxConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => {
            let path = default_config_path();
            if !path.exists() {
                return Ok(StmtxConfig::default());
            }
            path
        }
    };

    StmtxConfig::from_file(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))
}

/// Build the template registry, with `templates_dir` overriding the
/// configured directory.
pub fn build_registry(
    config: &StmtxConfig,
    templates_dir: Option<&Path>,
) -> anyhow::Result<TemplateRegistry> {
    let mut config = config.clone();
    if let Some(dir) = templates_dir {
        config.templates.dir = Some(dir.to_path_buf());
    }

    let registry = TemplateRegistry::from_config(&config)?;
    if registry.is_empty() {
        anyhow::bail!("No templates available. Set templates.dir or enable templates.include_builtin.");
    }
    Ok(registry)
}
