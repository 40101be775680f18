//! Format profile
//!
//! The learned description of the reference document's format. The service's
//! free-text analysis is kept alongside a [`LayoutSchema`] extracted
//! deterministically from the reference itself.

use crate::validation::{DocumentMetrics, RequiredMarker, ValidationConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Structural exemplar the learner analyzes. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDocument {
    text: String,
    source: Option<PathBuf>,
}

impl ReferenceDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    pub fn from_path(text: impl Into<String>, source: PathBuf) -> Self {
        Self {
            text: text.into(),
            source: Some(source),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }
}

/// Volume thresholds the synthesized document must meet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_units: usize,
    pub min_sections: usize,
    pub min_links: usize,
    pub min_length: usize,
}

impl From<&ValidationConfig> for Thresholds {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            min_units: config.min_units,
            min_sections: config.min_sections,
            min_links: config.min_links,
            min_length: config.min_length,
        }
    }
}

/// Deterministic structural facts about the reference document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSchema {
    /// Every marker the output must carry, in check order
    pub required_markers: Vec<RequiredMarker>,
    /// Names of required markers the reference itself lacks
    pub reference_missing: Vec<String>,
    /// Section headings in document order
    pub section_headings: Vec<String>,
    pub unit_marker: String,
    pub section_marker: String,
    pub link_marker: String,
    pub reference_metrics: DocumentMetrics,
    pub thresholds: Thresholds,
}

impl LayoutSchema {
    pub fn extract(reference: &ReferenceDocument, config: &ValidationConfig) -> Self {
        let text = reference.text();
        let reference_missing = config
            .required_markers
            .iter()
            .filter(|marker| !text.contains(marker.pattern.as_str()))
            .map(|marker| marker.name.clone())
            .collect();

        Self {
            required_markers: config.required_markers.clone(),
            reference_missing,
            section_headings: extract_headings(text, "h2"),
            unit_marker: config.unit_marker.clone(),
            section_marker: config.section_marker.clone(),
            link_marker: config.link_marker.clone(),
            reference_metrics: DocumentMetrics::measure(text, config),
            thresholds: Thresholds::from(config),
        }
    }

    /// Prompt block describing the schema
    pub fn render(&self) -> String {
        let mut out = String::from("## Layout schema\n");

        out.push_str("Required literal markers (each must appear verbatim):\n");
        for marker in &self.required_markers {
            out.push_str(&format!("- {}: `{}`\n", marker.name, marker.pattern));
        }

        if !self.section_headings.is_empty() {
            out.push_str("Section headings, in order:\n");
            for (index, heading) in self.section_headings.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", index + 1, heading));
            }
        }

        out.push_str(&format!(
            "Each news item opens with `{}`; each section opens with `{}`; every outbound link carries `{}`.\n",
            self.unit_marker, self.section_marker, self.link_marker
        ));
        out.push_str(&format!(
            "Minimums: {} items, {} sections, {} links, {} characters.\n",
            self.thresholds.min_units,
            self.thresholds.min_sections,
            self.thresholds.min_links,
            self.thresholds.min_length
        ));
        out
    }
}

/// Output of the learning stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatProfile {
    /// The service's own description of the format, unparsed
    pub analysis: String,
    pub schema: LayoutSchema,
}

/// Inner text of every `<tag ...>...</tag>` element, tags stripped and
/// whitespace collapsed. Empty headings are skipped.
pub fn extract_headings(text: &str, tag: &str) -> Vec<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut headings = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(&open) {
        let after_open = &rest[start + open.len()..];
        // Guard against prefixes such as <h2x> or <header>
        match after_open.chars().next() {
            Some(c) if c == '>' || c.is_whitespace() => {}
            _ => {
                rest = after_open;
                continue;
            }
        }
        let Some(body_start) = after_open.find('>') else {
            break;
        };
        let body = &after_open[body_start + 1..];
        let Some(end) = body.find(&close) else {
            break;
        };
        let heading = collapse_whitespace(&strip_tags(&body[..end]));
        if !heading.is_empty() {
            headings.push(heading);
        }
        rest = &body[end + close.len()..];
    }
    headings
}

fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
