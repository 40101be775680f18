//! Content Validation
//!
//! Structural and volume checks on a synthesized document. The validator never
//! parses the document: it looks for literal markers and counts recurring ones.
//! Given the same text and configuration it always produces the same report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal that must appear in the document at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredMarker {
    /// Name reported when the marker is missing
    pub name: String,
    /// Case-sensitive substring searched for
    pub pattern: String,
}

impl RequiredMarker {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }
}

/// Thresholds and markers the validator enforces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Presence checks, reported in this order
    #[serde(default = "default_required_markers")]
    pub required_markers: Vec<RequiredMarker>,

    /// Marker that opens one repeated content unit (one news item)
    #[serde(default = "default_unit_marker")]
    pub unit_marker: String,

    /// Marker that opens one content section
    #[serde(default = "default_section_marker")]
    pub section_marker: String,

    /// Marker carried by every outbound link
    #[serde(default = "default_link_marker")]
    pub link_marker: String,

    #[serde(default = "default_min_units")]
    pub min_units: usize,

    #[serde(default = "default_min_sections")]
    pub min_sections: usize,

    #[serde(default = "default_min_links")]
    pub min_links: usize,

    /// Minimum document length in characters
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

fn default_required_markers() -> Vec<RequiredMarker> {
    vec![
        RequiredMarker::new("doctype", "<!DOCTYPE html>"),
        RequiredMarker::new("stylesheet", "tailwindcss"),
        RequiredMarker::new("icon-library", "fontawesome"),
        RequiredMarker::new("theme-color", "#FF6B35"),
        RequiredMarker::new("theme-variable", "--sowork-orange"),
        RequiredMarker::new("title", "Tariff Policy Update"),
        RequiredMarker::new("news-card", "news-card"),
        RequiredMarker::new("date-badge", "date-badge"),
        RequiredMarker::new("source-badge", "source-badge"),
    ]
}

fn default_unit_marker() -> String {
    "<article".to_string()
}

fn default_section_marker() -> String {
    "<section".to_string()
}

fn default_link_marker() -> String {
    "target=\"_blank\"".to_string()
}

fn default_min_units() -> usize {
    10
}

fn default_min_sections() -> usize {
    4
}

fn default_min_links() -> usize {
    10
}

fn default_min_length() -> usize {
    15_000
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_markers: default_required_markers(),
            unit_marker: default_unit_marker(),
            section_marker: default_section_marker(),
            link_marker: default_link_marker(),
            min_units: default_min_units(),
            min_sections: default_min_sections(),
            min_links: default_min_links(),
            min_length: default_min_length(),
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<(), String> {
        for marker in &self.required_markers {
            if marker.name.trim().is_empty() {
                return Err("Required marker name cannot be empty".to_string());
            }
            if marker.pattern.is_empty() {
                return Err(format!("Required marker '{}' has an empty pattern", marker.name));
            }
        }
        for (label, value) in [
            ("unit_marker", &self.unit_marker),
            ("section_marker", &self.section_marker),
            ("link_marker", &self.link_marker),
        ] {
            if value.is_empty() {
                return Err(format!("{} cannot be empty", label));
            }
        }
        Ok(())
    }
}

/// Volume metric checked against a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Units,
    Sections,
    Links,
    Length,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Units => "units",
            Metric::Sections => "sections",
            Metric::Links => "links",
            Metric::Length => "length",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One missing or deficient element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Deficiency {
    MissingMarker {
        name: String,
    },
    BelowThreshold {
        metric: Metric,
        observed: usize,
        required: usize,
    },
}

impl fmt::Display for Deficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deficiency::MissingMarker { name } => write!(f, "missing marker '{}'", name),
            Deficiency::BelowThreshold {
                metric,
                observed,
                required,
            } => write!(f, "{} below threshold ({}/{})", metric, observed, required),
        }
    }
}

/// Counts derived from a document's text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetrics {
    /// Length in characters, not bytes
    pub length: usize,
    pub units: usize,
    pub sections: usize,
    pub links: usize,
}

impl DocumentMetrics {
    pub fn measure(text: &str, config: &ValidationConfig) -> Self {
        Self {
            length: text.chars().count(),
            units: count_occurrences(text, &config.unit_marker),
            sections: count_occurrences(text, &config.section_marker),
            links: count_occurrences(text, &config.link_marker),
        }
    }
}

/// Non-overlapping occurrences of `pattern` in `text`
pub fn count_occurrences(text: &str, pattern: &str) -> usize {
    if pattern.is_empty() {
        return 0;
    }
    text.matches(pattern).count()
}

/// A synthesized candidate document with its derived metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub text: String,
    pub metrics: DocumentMetrics,
}

impl GeneratedDocument {
    pub fn new(text: String, config: &ValidationConfig) -> Self {
        let metrics = DocumentMetrics::measure(&text, config);
        Self { text, metrics }
    }
}

/// Verdict plus the ordered list of deficiencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub metrics: DocumentMetrics,
    pub deficiencies: Vec<Deficiency>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.deficiencies.is_empty()
    }

    pub fn missing_markers(&self) -> Vec<&str> {
        self.deficiencies
            .iter()
            .filter_map(|d| match d {
                Deficiency::MissingMarker { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Single-line rendering for logs and error messages
    pub fn summary_line(&self) -> String {
        if self.passed() {
            return "passed".to_string();
        }
        self.deficiencies
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Checks documents against a fixed [`ValidationConfig`].
#[derive(Debug, Clone)]
pub struct ContentValidator {
    config: ValidationConfig,
}

impl ContentValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, document: &GeneratedDocument) -> ValidationReport {
        self.validate_text(&document.text)
    }

    pub fn validate_text(&self, text: &str) -> ValidationReport {
        let metrics = DocumentMetrics::measure(text, &self.config);
        let mut deficiencies = Vec::new();

        for marker in &self.config.required_markers {
            if !text.contains(marker.pattern.as_str()) {
                deficiencies.push(Deficiency::MissingMarker {
                    name: marker.name.clone(),
                });
            }
        }

        let volume = [
            (Metric::Units, metrics.units, self.config.min_units),
            (Metric::Sections, metrics.sections, self.config.min_sections),
            (Metric::Links, metrics.links, self.config.min_links),
            (Metric::Length, metrics.length, self.config.min_length),
        ];
        for (metric, observed, required) in volume {
            if observed < required {
                deficiencies.push(Deficiency::BelowThreshold {
                    metric,
                    observed,
                    required,
                });
            }
        }

        ValidationReport {
            metrics,
            deficiencies,
        }
    }
}
