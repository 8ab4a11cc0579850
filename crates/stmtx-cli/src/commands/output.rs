//! Rendering extraction results as JSON, CSV or text.

use serde::Serialize;

use stmtx_core::models::extraction::{DocumentStatus, ExtractionResult};
use stmtx_core::models::portfolio::{Holding, PortfolioSummary};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per field
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

/// Everything reported for one document.
#[derive(Debug, Serialize)]
pub struct DocumentReport<'a> {
    pub document: &'a str,
    #[serde(flatten)]
    pub result: &'a ExtractionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holdings: Option<&'a [Holding]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<&'a PortfolioSummary>,
}

pub fn render(report: &DocumentReport<'_>, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

pub fn status_label(status: &DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Complete => "complete",
        DocumentStatus::Incomplete { .. } => "incomplete",
    }
}

fn format_csv(report: &DocumentReport<'_>) -> anyhow::Result<String> {
    // Holdings follow the fields with their own header
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(vec![]);

    wtr.write_record(["field", "value", "raw", "valid", "confidence", "source", "errors"])?;

    for field in &report.result.fields {
        let errors: Vec<String> = field.errors.iter().map(|e| e.to_string()).collect();
        wtr.write_record([
            field.name.as_str(),
            &field.value.as_ref().map(|v| v.to_string()).unwrap_or_default(),
            field.raw.as_str(),
            if field.valid { "true" } else { "false" },
            &format!("{:.2}", field.confidence),
            match field.source {
                stmtx_core::ValueSource::Template => "template",
                stmtx_core::ValueSource::Fallback => "fallback",
            },
            &errors.join("; "),
        ])?;
    }

    for name in &report.result.missing {
        wtr.write_record([name.as_str(), "", "", "false", "0.00", "", "missing"])?;
    }

    if let Some(holdings) = report.holdings {
        wtr.write_record([""])?;
        wtr.write_record(["isin", "isin_valid", "security_name", "quantity", "price", "market_value"])?;
        for h in holdings {
            wtr.write_record([
                h.isin.as_str(),
                if h.isin_valid { "true" } else { "false" },
                h.security_name.as_deref().unwrap_or(""),
                &optional(h.quantity),
                &optional(h.price),
                &optional(h.market_value),
            ])?;
        }
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_text(report: &DocumentReport<'_>) -> String {
    let result = report.result;
    let mut output = String::new();

    output.push_str(&format!("Document: {}\n", report.document));
    output.push_str(&format!(
        "Template: {}\n",
        result.template.as_deref().unwrap_or("(none)")
    ));
    if !result.institution.is_empty() {
        output.push_str(&format!("Institution: {}\n", result.institution));
    }
    output.push_str(&format!("Status: {}\n", status_label(&result.status)));
    output.push('\n');

    output.push_str("Fields:\n");
    let width = result.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
    for field in &result.fields {
        let value = field
            .value
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| field.raw.clone());
        let marker = if field.valid { "" } else { "  (invalid)" };
        output.push_str(&format!("  {:width$}  {}{}\n", field.name, value, marker, width = width));
    }

    if !result.missing.is_empty() {
        output.push_str(&format!("\nMissing: {}\n", result.missing.join(", ")));
    }

    if !result.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    if let Some(holdings) = report.holdings {
        output.push_str(&format!("\nHoldings ({}):\n", holdings.len()));
        for h in holdings {
            output.push_str(&format!(
                "  {} {}  qty {}  price {}  value {}{}\n",
                h.isin,
                h.security_name.as_deref().unwrap_or("-"),
                optional(h.quantity),
                optional(h.price),
                optional(h.market_value),
                if h.isin_valid { "" } else { "  (bad check digit)" },
            ));
        }
    }

    if let Some(portfolio) = report.portfolio {
        output.push_str(&format!(
            "\nPortfolio: {} securities, total value {:.2}\n",
            portfolio.total_securities, portfolio.total_portfolio_value
        ));
        for d in &portfolio.price_discrepancies {
            output.push_str(&format!(
                "  Price discrepancy {}: {} - {} ({:.2}%)\n",
                d.isin, d.min_price, d.max_price, d.difference_percent
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stmtx_core::extract::{ExtractionContext, StatementProcessor};
    use stmtx_core::registry::TemplateRegistry;

    fn result() -> ExtractionResult {
        let registry = Arc::new(TemplateRegistry::with_builtin().unwrap());
        StatementProcessor::new(registry)
            .process(
                &ExtractionContext::new("doc"),
                "Securities Statement\nSecurity: Apple Inc.\nISIN: US0378331005\nQuantity: 100\n",
            )
            .unwrap()
    }

    #[test]
    fn test_render_json_flattens_result() {
        let result = result();
        let report = DocumentReport { document: "doc.txt", result: &result, holdings: None, portfolio: None };

        let json: serde_json::Value = serde_json::from_str(&render(&report, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["document"], "doc.txt");
        assert_eq!(json["template"], "generic_bank_template");
        assert_eq!(json["status"]["status"], "complete");
        assert!(json.get("holdings").is_none());
    }

    #[test]
    fn test_render_csv_rows() {
        let result = result();
        let report = DocumentReport { document: "doc.txt", result: &result, holdings: None, portfolio: None };

        let csv = render(&report, OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("field,value,raw,valid,confidence,source,errors"));
        assert!(csv.contains("isin,US0378331005,US0378331005,true,0.95,template,"));
    }

    #[test]
    fn test_render_text() {
        let result = result();
        let report = DocumentReport { document: "doc.txt", result: &result, holdings: None, portfolio: None };

        let text = render(&report, OutputFormat::Text).unwrap();
        assert!(text.contains("Template: generic_bank_template"));
        assert!(text.contains("Status: complete"));
        assert!(text.contains("US0378331005"));
    }
}
