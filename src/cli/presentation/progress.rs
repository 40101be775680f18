//! Terminal narrative for pipeline transitions.

use crate::orchestrator::{PipelineEvent, PipelineState, ProgressSink};
use owo_colors::OwoColorize;

/// Prints one line per transition to stdout.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    pub fn new() -> Self {
        Self
    }

    /// Line for an event, if it deserves one
    pub fn render(event: &PipelineEvent<'_>) -> Option<String> {
        match event {
            PipelineEvent::Entered { state, retry } => {
                let attempt = format!("attempt {}/{}", retry.attempt + 1, retry.max_retries + 1);
                match state {
                    PipelineState::Init => None,
                    PipelineState::Probing => {
                        Some(format!("{} Checking service connectivity", "→".cyan()))
                    }
                    PipelineState::Learning => Some(format!(
                        "{} Learning reference format ({})",
                        "→".cyan(),
                        attempt
                    )),
                    PipelineState::Synthesizing => {
                        Some(format!("{} Synthesizing document", "→".cyan()))
                    }
                    PipelineState::Validating => {
                        Some(format!("{} Validating document", "→".cyan()))
                    }
                    PipelineState::Retrying => Some(format!(
                        "{} Retrying: {}",
                        "↻".yellow(),
                        retry.last_failure.as_deref().unwrap_or("unknown failure")
                    )),
                    PipelineState::Done => Some(format!("{} Pipeline complete", "✓".green())),
                    PipelineState::Failed => Some(format!("{} Pipeline failed", "✗".red())),
                }
            }
            PipelineEvent::StageFailed { state, error } => {
                Some(format!("  {} {} failed: {}", "✗".red(), state, error))
            }
            PipelineEvent::Validated { report } => {
                if report.passed() {
                    Some(format!("  {} All checks passed", "✓".green()))
                } else {
                    let mut line = format!(
                        "  {} {} deficiencies",
                        "!".yellow(),
                        report.deficiencies.len()
                    );
                    for deficiency in &report.deficiencies {
                        line.push_str(&format!("\n    - {}", deficiency));
                    }
                    Some(line)
                }
            }
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn emit(&self, event: PipelineEvent<'_>) {
        if let Some(line) = Self::render(&event) {
            println!("{}", line);
        }
    }
}
