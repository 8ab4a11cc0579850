//! Templates command - list, show, check and rank templates.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use stmtx_core::template::{load_file, CompileOptions};

use super::document::read_document;
use super::{build_registry, load_config};

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    /// Directory with additional template files
    #[arg(long, global = true)]
    templates_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: TemplatesCommand,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// List registered templates
    List,

    /// Print a template definition
    Show {
        /// Template name
        name: String,

        /// Print as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },

    /// Compile template files and report errors
    Check {
        /// Template files (.yaml, .yml or .json)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Score every template against a document
    Rank {
        /// Input file (.txt or .pdf)
        input: PathBuf,
    },
}

pub fn run(args: TemplatesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let templates_dir = args.templates_dir.as_deref();

    match args.command {
        TemplatesCommand::List => {
            let registry = build_registry(&config, templates_dir)?;
            for template in registry.iter() {
                let required = template.fields().iter().filter(|f| f.required).count();
                println!(
                    "{}  {}",
                    style(template.name()).bold(),
                    template.institution()
                );
                println!(
                    "    {} fields ({} required), {} markers{}",
                    template.fields().len(),
                    required,
                    template.marker_count(),
                    if template.sample_identifiers().is_empty() {
                        String::new()
                    } else {
                        format!(", samples: {}", template.sample_identifiers().join(", "))
                    }
                );
            }
            Ok(())
        }
        TemplatesCommand::Show { name, json } => {
            let registry = build_registry(&config, templates_dir)?;
            let template = registry
                .get(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown template: {}", name))?;

            if json {
                println!("{}", serde_json::to_string_pretty(template.spec())?);
            } else {
                print!("{}", serde_yaml::to_string(template.spec())?);
            }
            Ok(())
        }
        TemplatesCommand::Check { files } => {
            let options = CompileOptions {
                regex_size_limit: config.extraction.regex_size_limit,
            };

            let mut failed = 0;
            for file in &files {
                match load_file(file, &options) {
                    Ok(template) => println!(
                        "{} {} ({}, {} fields)",
                        style("✓").green(),
                        file.display(),
                        template.name(),
                        template.fields().len()
                    ),
                    Err(e) => {
                        failed += 1;
                        println!("{} {}: {}", style("✗").red(), file.display(), e);
                    }
                }
            }

            if failed > 0 {
                anyhow::bail!("{} of {} template files failed to load", failed, files.len());
            }
            Ok(())
        }
        TemplatesCommand::Rank { input } => {
            let registry = build_registry(&config, templates_dir)?;
            let text = read_document(&input, &config)?;

            let selected = registry.select_template(&text).map(|t| t.name().to_string());
            let mut scores = registry.rank(&text);
            // Stable sort keeps registration order among equal scores
            scores.sort_by(|a, b| b.score.cmp(&a.score));

            for score in &scores {
                let marker = if selected.as_deref() == Some(score.template.as_str()) {
                    style("*").green().to_string()
                } else {
                    " ".to_string()
                };
                println!("{} {:>3}/{:<3} {}", marker, score.score, score.markers, score.template);
            }

            if selected.is_none() {
                println!(
                    "{} No template reaches the threshold of {} markers",
                    style("!").yellow(),
                    registry.min_marker_matches()
                );
            }
            Ok(())
        }
    }
}
