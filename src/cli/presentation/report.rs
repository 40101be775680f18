//! Final report: metrics table, deficiencies and artifact locations.

use crate::orchestrator::{Acceptance, RunOutcome};
use crate::persist::PersistReceipt;
use crate::validation::ValidationReport;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Metrics table followed by the deficiency list.
pub fn format_report(report: &ValidationReport) -> String {
    let metrics = &report.metrics;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["News items".to_string(), metrics.units.to_string()]);
    table.add_row(vec!["Sections".to_string(), metrics.sections.to_string()]);
    table.add_row(vec!["Links".to_string(), metrics.links.to_string()]);
    table.add_row(vec!["Length (chars)".to_string(), metrics.length.to_string()]);

    let mut out = format!("{}\n{}\n", format_section_heading("Content report"), table);
    if report.deficiencies.is_empty() {
        out.push_str(&format!("{}\n", "No deficiencies".green()));
    } else {
        out.push_str(&format!("\n{}\n", format_section_heading("Deficiencies")));
        for deficiency in &report.deficiencies {
            out.push_str(&format!("  - {}\n", deficiency));
        }
    }
    out
}

/// Everything printed after a successful run.
pub fn format_run_summary(outcome: &RunOutcome, receipt: &PersistReceipt) -> String {
    let status = match outcome.acceptance {
        Acceptance::Accepted => format!("{}", "Validation passed".green().bold()),
        Acceptance::Degraded => format!(
            "{}",
            "Accepted with warnings after exhausting retries".yellow().bold()
        ),
    };

    let mut out = format!("{}\n\n", status);
    out.push_str(&format_report(&outcome.report));
    out.push_str(&format!(
        "\nAttempts: {} (retries used: {}/{})\n",
        outcome.learn_calls, outcome.retry.attempt, outcome.retry.max_retries
    ));
    out.push_str(&format!(
        "Document: {} ({} bytes)\n",
        receipt.document_path.display(),
        receipt.document_bytes
    ));
    for path in &receipt.published {
        out.push_str(&format!("Site:     {}\n", path.display()));
    }
    match receipt.summary_path {
        Some(ref path) => out.push_str(&format!("Summary:  {}\n", path.display())),
        None => out.push_str(&format!("Summary:  {}\n", "not written".yellow())),
    }
    out
}
