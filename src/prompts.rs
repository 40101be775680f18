//! Prompt and template sources.
//!
//! The reference document is always read from storage; the instruction texts
//! fall back to built-in defaults when no file is configured.

use crate::error::PipelineError;
use crate::profile::ReferenceDocument;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_ANALYSIS_INSTRUCTIONS: &str = "You are a web layout analyst. Given a reference \
HTML document, describe precisely how it is built: document skeleton and head assets, CSS \
variables and colors, the header, every content section and its heading, the markup of one \
news item card (date badge, source badge, headline, summary, link), hover effects, the footer, \
and responsive behavior. Be concrete: name classes, attributes and colors exactly as they \
appear. Do not reproduce the news content itself.";

pub const DEFAULT_GENERATION_INSTRUCTIONS: &str = "You are a professional website content \
editor. Produce a complete, self-contained HTML5 document that follows the given layout schema \
and format analysis exactly while replacing all news content with the latest reporting for the \
stated period. Summaries must faithfully reflect the original reporting without speculation. \
Every news item states its date, source and original link.";

/// Where the pipeline's text inputs come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Reference document, relative to the workspace unless absolute
    #[serde(default = "default_reference")]
    pub reference: PathBuf,

    /// Optional override for the analysis instructions
    #[serde(default)]
    pub analysis_instructions: Option<PathBuf>,

    /// Optional override for the generation instructions
    #[serde(default)]
    pub generation_instructions: Option<PathBuf>,
}

fn default_reference() -> PathBuf {
    PathBuf::from("templates/reference.html")
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            reference: default_reference(),
            analysis_instructions: None,
            generation_instructions: None,
        }
    }
}

/// Loaded text inputs for one run
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub reference: ReferenceDocument,
    pub analysis_instructions: String,
    pub generation_instructions: String,
}

impl PromptSet {
    pub fn load(config: &PromptConfig, workspace_root: &Path) -> Result<Self, PipelineError> {
        let reference_path = resolve(workspace_root, &config.reference);
        let reference_text = read_required(&reference_path, "reference document")?;
        if reference_text.trim().is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "Reference document {} is empty",
                reference_path.display()
            )));
        }

        let analysis_instructions = load_or_default(
            workspace_root,
            config.analysis_instructions.as_deref(),
            DEFAULT_ANALYSIS_INSTRUCTIONS,
        )?;
        let generation_instructions = load_or_default(
            workspace_root,
            config.generation_instructions.as_deref(),
            DEFAULT_GENERATION_INSTRUCTIONS,
        )?;

        Ok(Self {
            reference: ReferenceDocument::from_path(reference_text, reference_path),
            analysis_instructions,
            generation_instructions,
        })
    }
}

fn resolve(workspace_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    }
}

fn read_required(path: &Path, what: &str) -> Result<String, PipelineError> {
    std::fs::read_to_string(path).map_err(|e| {
        PipelineError::ConfigError(format!("Failed to read {} {}: {}", what, path.display(), e))
    })
}

fn load_or_default(
    workspace_root: &Path,
    path: Option<&Path>,
    default: &str,
) -> Result<String, PipelineError> {
    match path {
        Some(path) => {
            let resolved = resolve(workspace_root, path);
            debug!(path = %resolved.display(), "Loading instructions from file");
            read_required(&resolved, "instructions")
        }
        None => Ok(default.to_string()),
    }
}

/// Human label of the ISO week containing `date`
pub fn period_label(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("Week {} of {}", week.week(), week.year())
}
