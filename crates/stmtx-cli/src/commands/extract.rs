//! Extract command - extract fields from a single statement.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use stmtx_core::extract::{ExtractionContext, StatementProcessor};
use stmtx_core::holdings::HoldingScanner;
use stmtx_core::models::extraction::DocumentStatus;
use stmtx_core::models::portfolio::PortfolioSummary;

use super::document::read_document;
use super::output::{render, DocumentReport, OutputFormat};
use super::{build_registry, load_config};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (.txt or .pdf)
    #[arg(required = true)]
    input: PathBuf,

    /// Use this template instead of selecting one by layout markers
    #[arg(short, long)]
    template: Option<String>,

    /// Prefer the template of this institution
    #[arg(short, long)]
    institution: Option<String>,

    /// Directory with additional template files
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Scan for holdings and add a portfolio summary
    #[arg(long)]
    holdings: bool,

    /// Show extraction confidence scores
    #[arg(long)]
    show_confidence: bool,

    /// Exit with an error when required fields are missing or invalid
    #[arg(long)]
    fail_incomplete: bool,
}

pub fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let registry = Arc::new(build_registry(&config, args.templates_dir.as_deref())?);

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);

    pb.set_message("Reading document...");
    let text = read_document(&args.input, &config)?;

    pb.set_message("Extracting fields...");
    let document_id = args.input.display().to_string();
    let mut ctx = ExtractionContext::new(document_id.as_str());
    if let Some(template) = &args.template {
        ctx = ctx.with_template(template.as_str());
    }
    if let Some(institution) = &args.institution {
        ctx = ctx.with_institution(institution.as_str());
    }

    let processor = StatementProcessor::from_config(registry, &config);
    let result = processor.process(&ctx, &text);
    pb.finish_and_clear();
    let result = result?;

    let (holdings, portfolio) = if args.holdings {
        let holdings = HoldingScanner::from_config(&config.holdings).scan_with_source(&text, &document_id);
        let portfolio = PortfolioSummary::from_holdings(&holdings, config.holdings.price_tolerance);
        (Some(holdings), Some(portfolio))
    } else {
        (None, None)
    };

    let report = DocumentReport {
        document: &document_id,
        result: &result,
        holdings: holdings.as_deref(),
        portfolio: portfolio.as_ref(),
    };
    let output = render(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        eprintln!();
        eprintln!(
            "{} Extraction confidence: {:.1}%",
            style("ℹ").blue(),
            result.confidence * 100.0
        );
        for field in &result.fields {
            eprintln!("   {:<20} {:.1}%", field.name, field.confidence * 100.0);
        }
        eprintln!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    if let DocumentStatus::Incomplete { missing, invalid } = &result.status {
        if args.fail_incomplete {
            let mut problems = missing.clone();
            problems.extend(invalid.iter().map(|f| format!("{} (invalid)", f)));
            anyhow::bail!("Extraction incomplete: {}", problems.join(", "));
        }
    }

    Ok(())
}
