//! CLI presentation: the live run narrative and the final report.

mod progress;
mod report;

pub use progress::ConsoleProgress;
pub use report::{format_report, format_run_summary};
