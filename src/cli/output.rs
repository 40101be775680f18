//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::cli::presentation::format_report;
use crate::error::PipelineError;

/// Map domain/service errors to a string for CLI output.
/// A validation failure still shows what the document contained.
pub fn map_error(e: &PipelineError) -> String {
    match e {
        PipelineError::Validation { report } => format!("{}\n\n{}", format_report(report), e),
        _ => e.to_string(),
    }
}
