//! Batch processing command for multiple statement files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use stmtx_core::extract::{ExtractionContext, StatementProcessor};
use stmtx_core::models::config::StmtxConfig;
use stmtx_core::models::extraction::ExtractionResult;

use super::document::{is_supported, read_document};
use super::output::{render, status_label, DocumentReport, OutputFormat};
use super::{build_registry, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Use this template for every file
    #[arg(short, long)]
    template: Option<String>,

    /// Directory with additional template files
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileOutcome {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let registry = Arc::new(build_registry(&config, args.templates_dir.as_deref())?);
    let processor = StatementProcessor::from_config(registry, &config);

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(output_dir) = &args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut outcomes = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = process_single_file(&path, &processor, &args, &config);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(result) => outcomes.push(FileOutcome {
                path,
                result: Some(result),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if !args.continue_on_error {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing {} failed: {}", path.display(), error_msg);
                }
                warn!("Failed to process {}: {}", path.display(), error_msg);
                outcomes.push(FileOutcome {
                    path,
                    result: None,
                    error: Some(error_msg),
                    processing_time_ms,
                });
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    if let Some(output_dir) = &args.output_dir {
        for outcome in &outcomes {
            if let Some(result) = &outcome.result {
                write_output(output_dir, &outcome.path, result, args.format)?;
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let complete = outcomes
        .iter()
        .filter(|o| o.result.as_ref().is_some_and(|r| r.is_complete()))
        .count();
    let incomplete = outcomes
        .iter()
        .filter(|o| o.result.as_ref().is_some_and(|r| !r.is_complete()))
        .count();
    let failed: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} complete, {} incomplete, {} failed",
        style(complete).green(),
        style(incomplete).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            println!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    processor: &StatementProcessor,
    args: &BatchArgs,
    config: &StmtxConfig,
) -> anyhow::Result<ExtractionResult> {
    let text = read_document(path, config)?;

    let mut ctx = ExtractionContext::new(file_name(path));
    if let Some(template) = &args.template {
        ctx = ctx.with_template(template.as_str());
    }

    Ok(processor.process(&ctx, &text)?)
}

fn write_output(
    output_dir: &Path,
    path: &Path,
    result: &ExtractionResult,
    format: OutputFormat,
) -> anyhow::Result<()> {
    // a.txt -> a.txt.json, distinct from a.pdf -> a.pdf.json
    let name = match file_name(path) {
        "" => "statement",
        name => name,
    };
    let output_path = output_dir.join(format!("{}.{}", name, format.extension()));

    let report = DocumentReport {
        document: file_name(path),
        result,
        holdings: None,
        portfolio: None,
    };

    fs::write(&output_path, render(&report, format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|s| s.to_str()).unwrap_or("")
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "file",
        "status",
        "template",
        "missing_fields",
        "confidence",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = file_name(&outcome.path);

        if let Some(result) = &outcome.result {
            wtr.write_record([
                filename,
                status_label(&result.status),
                result.template.as_deref().unwrap_or(""),
                &result.missing.join(";"),
                &format!("{:.2}", result.confidence),
                &outcome.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                &outcome.processing_time_ms.to_string(),
                outcome.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
