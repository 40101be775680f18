//! Artifact persistence
//!
//! The primary document is overwritten on every run and prefixed with a
//! generation-timestamp marker; failing to write it fails the run. The run
//! summary is best-effort. The diagnostic log only ever grows.
//!
//! With `archive_dir` set, each run also publishes into a static-site folder:
//! a month-stamped copy (`{archive_prefix}_YYYYMM.html`) and `index.html`.

use crate::error::PipelineError;
use crate::orchestrator::Acceptance;
use crate::validation::ValidationReport;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Artifact locations, relative to the workspace unless absolute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_document")]
    pub document: PathBuf,

    #[serde(default = "default_summary")]
    pub summary: PathBuf,

    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,

    /// Static-site folder for the monthly archive copy and `index.html`
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,

    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,
}

fn default_document() -> PathBuf {
    PathBuf::from("generated-content.html")
}

fn default_summary() -> PathBuf {
    PathBuf::from("README.md")
}

fn default_error_log() -> PathBuf {
    PathBuf::from("error.log")
}

fn default_archive_prefix() -> String {
    "bulletin".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            document: default_document(),
            summary: default_summary(),
            error_log: default_error_log(),
            archive_dir: None,
            archive_prefix: default_archive_prefix(),
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.document.as_os_str().is_empty() {
            return Err("Document path cannot be empty".to_string());
        }
        if self.document == self.summary {
            return Err("Document and summary paths must differ".to_string());
        }
        if self.archive_dir.is_some() {
            let prefix = self.archive_prefix.trim();
            if prefix.is_empty() || prefix.contains(['/', '\\']) {
                return Err(format!(
                    "Archive prefix must be a plain, non-empty file name prefix (got '{}')",
                    self.archive_prefix
                ));
            }
        }
        Ok(())
    }
}

/// Run facts rendered into the summary alongside the report
#[derive(Debug, Clone)]
pub struct SummaryContext {
    pub period_label: String,
    pub model: String,
    pub acceptance: Acceptance,
    /// Total learn+synthesize attempts made
    pub attempts: usize,
}

/// What was written
#[derive(Debug, Clone)]
pub struct PersistReceipt {
    pub document_path: PathBuf,
    pub document_bytes: usize,
    /// Monthly archive copy and site index, when publishing is configured
    pub published: Vec<PathBuf>,
    /// `None` when the summary could not be written
    pub summary_path: Option<PathBuf>,
    pub content_digest: String,
}

/// First line of every primary artifact
pub fn timestamp_marker(generated_at: DateTime<Utc>) -> String {
    format!(
        "<!-- Generated on: {} -->",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// blake3 digest of the document body, hex encoded
pub fn content_digest(text: &str) -> String {
    hex::encode(blake3::hash(text.as_bytes()).as_bytes())
}

/// Archive copy name for the month of `generated_at`
pub fn archive_file_name(prefix: &str, generated_at: DateTime<Utc>) -> String {
    format!("{}_{}.html", prefix, generated_at.format("%Y%m"))
}

pub struct FilePersister {
    document_path: PathBuf,
    summary_path: PathBuf,
    error_log_path: PathBuf,
    archive_dir: Option<PathBuf>,
    archive_prefix: String,
}

impl FilePersister {
    pub fn new(config: &OutputConfig, workspace_root: &Path) -> Self {
        let resolve = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                workspace_root.join(path)
            }
        };
        Self {
            document_path: resolve(&config.document),
            summary_path: resolve(&config.summary),
            error_log_path: resolve(&config.error_log),
            archive_dir: config.archive_dir.as_deref().map(resolve),
            archive_prefix: config.archive_prefix.trim().to_string(),
        }
    }

    pub fn error_log_path(&self) -> &Path {
        &self.error_log_path
    }

    /// Write the document (fatal on failure) and the summary (logged on failure).
    pub fn persist(
        &self,
        text: &str,
        report: &ValidationReport,
        context: &SummaryContext,
        generated_at: DateTime<Utc>,
    ) -> Result<PersistReceipt, PipelineError> {
        let document_bytes = self.write_document(text, generated_at)?;
        let published = self.publish(text, generated_at)?;
        let content_digest = content_digest(text);

        let document_name = self
            .document_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let summary = render_summary(
            report,
            context,
            generated_at,
            document_bytes,
            &content_digest,
            &document_name,
        );
        let summary_path = match write_file(&self.summary_path, summary.as_bytes()) {
            Ok(()) => Some(self.summary_path.clone()),
            Err(e) => {
                warn!(
                    path = %self.summary_path.display(),
                    error = %e,
                    "Failed to write run summary"
                );
                None
            }
        };

        Ok(PersistReceipt {
            document_path: self.document_path.clone(),
            document_bytes,
            published,
            summary_path,
            content_digest,
        })
    }

    /// Overwrite the primary artifact; returns bytes written.
    pub fn write_document(
        &self,
        text: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<usize, PipelineError> {
        let content = marked(text, generated_at);
        write_artifact(&self.document_path, &content)?;
        info!(
            path = %self.document_path.display(),
            bytes = content.len(),
            "Document written"
        );
        Ok(content.len())
    }

    /// Write the monthly archive copy and the site index. No-op without
    /// `archive_dir`; a failed write is fatal like the primary artifact.
    pub fn publish(
        &self,
        text: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        let Some(ref dir) = self.archive_dir else {
            return Ok(Vec::new());
        };
        let content = marked(text, generated_at);
        let targets = [
            dir.join(archive_file_name(&self.archive_prefix, generated_at)),
            dir.join("index.html"),
        ];
        for target in &targets {
            write_artifact(target, &content)?;
        }
        info!(
            archive = %targets[0].display(),
            index = %targets[1].display(),
            "Site copies published"
        );
        Ok(targets.to_vec())
    }

    /// Append one `[timestamp] message` line to the diagnostic log.
    pub fn append_error(&self, at: DateTime<Utc>, message: &str) -> Result<(), PipelineError> {
        append_error_line(&self.error_log_path, at, message)
    }
}

/// Append one `[timestamp] message` line to `path`, creating it if needed.
pub fn append_error_line(
    path: &Path,
    at: DateTime<Utc>,
    message: &str,
) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    // Keep one line per entry
    let single_line = message.replace(['\r', '\n'], " ");
    writeln!(
        file,
        "[{}] {}",
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        single_line
    )?;
    Ok(())
}

fn marked(text: &str, generated_at: DateTime<Utc>) -> String {
    format!("{}\n{}", timestamp_marker(generated_at), text)
}

fn write_artifact(path: &Path, content: &str) -> Result<(), PipelineError> {
    write_file(path, content.as_bytes()).map_err(|e| {
        PipelineError::Persistence(format!("Failed to write {}: {}", path.display(), e))
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)
}

pub fn render_summary(
    report: &ValidationReport,
    context: &SummaryContext,
    generated_at: DateTime<Utc>,
    document_bytes: usize,
    content_digest: &str,
    document_name: &str,
) -> String {
    let metrics = &report.metrics;
    let status = match context.acceptance {
        Acceptance::Accepted => "passed",
        Acceptance::Degraded => "accepted with warnings",
    };

    let mut out = String::from("# Latest generated bulletin\n\n## Generation\n");
    out.push_str(&format!(
        "- **Generated:** {}\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    out.push_str(&format!("- **Period:** {}\n", context.period_label));
    out.push_str(&format!("- **Model:** {}\n", context.model));
    out.push_str(&format!("- **Attempts:** {}\n", context.attempts));
    out.push_str(&format!("- **Artifact size:** {} bytes\n", document_bytes));
    out.push_str(&format!("- **Content digest:** `{}`\n", content_digest));

    out.push_str("\n## Content\n");
    out.push_str(&format!("- News items: {}\n", metrics.units));
    out.push_str(&format!("- Sections: {}\n", metrics.sections));
    out.push_str(&format!("- Links: {}\n", metrics.links));
    out.push_str(&format!("- Length: {} characters\n", metrics.length));

    out.push_str(&format!("\n## Validation: {}\n", status));
    if report.deficiencies.is_empty() {
        out.push_str("No deficiencies.\n");
    } else {
        for deficiency in &report.deficiencies {
            out.push_str(&format!("- {}\n", deficiency));
        }
    }

    out.push_str(&format!(
        "\n## Usage\n\
         1. Open `{}` and copy its contents.\n\
         2. Paste into the site's HTML embed.\n\
         3. Publish.\n",
        document_name
    ));
    out
}
