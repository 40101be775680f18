//! Stage 2: synthesize a new document from the learned format.

use crate::credential::Credential;
use crate::error::{PipelineError, ServiceErrorKind};
use crate::pipeline::StageConfig;
use crate::profile::FormatProfile;
use crate::provider::{ChatMessage, ModelProviderClient};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Content rules stated to the service alongside the format profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequirements {
    /// Page title; should match the title marker the validator checks
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_audience")]
    pub audience: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Sections to produce, in order
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,

    /// Topic categories that must not appear
    #[serde(default = "default_prohibited_topics")]
    pub prohibited_topics: Vec<String>,

    /// How to annotate items whose source does not concern the audience directly
    #[serde(default = "default_annotation_rule")]
    pub annotation_rule: String,
}

fn default_title() -> String {
    "Tariff Policy Update - Business Intelligence for Taiwanese Exporters".to_string()
}

fn default_audience() -> String {
    "Taiwanese exporters selling into the United States".to_string()
}

fn default_language() -> String {
    "Traditional Chinese".to_string()
}

fn default_sections() -> Vec<String> {
    vec![
        "Latest Policy Overview".to_string(),
        "Expert Views".to_string(),
        "US E-commerce Platform Policies".to_string(),
        "EU, Japan and Korea Tariff Policies".to_string(),
    ]
}

fn default_prohibited_topics() -> Vec<String> {
    vec!["statements or actions of individual government leaders".to_string()]
}

fn default_annotation_rule() -> String {
    "If the original article does not mention Taiwan directly, add a visible note saying so."
        .to_string()
}

impl Default for SynthesisRequirements {
    fn default() -> Self {
        Self {
            title: default_title(),
            audience: default_audience(),
            language: default_language(),
            sections: default_sections(),
            prohibited_topics: default_prohibited_topics(),
            annotation_rule: default_annotation_rule(),
        }
    }
}

/// Strip one wrapping code fence: a leading fence line (with an optional
/// language tag) and a trailing fence, each only at the very edge of the text.
pub fn unwrap_code_fence(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(after) = text.strip_prefix("```") {
        // Drop the info string (e.g. `html`) up to the end of the fence line
        text = match after.find('\n') {
            Some(newline) if !after[..newline].contains('<') => &after[newline + 1..],
            Some(_) => after,
            None => after.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    if let Some(before) = text.trim_end().strip_suffix("```") {
        text = before;
    }
    text.trim().to_string()
}

/// Submits the format profile and content requirements; returns the unwrapped
/// document text.
pub struct ContentSynthesizer<'a> {
    client: &'a dyn ModelProviderClient,
    credential: &'a Credential,
    stage: &'a StageConfig,
    instructions: &'a str,
    requirements: &'a SynthesisRequirements,
}

impl<'a> ContentSynthesizer<'a> {
    pub fn new(
        client: &'a dyn ModelProviderClient,
        credential: &'a Credential,
        stage: &'a StageConfig,
        instructions: &'a str,
        requirements: &'a SynthesisRequirements,
    ) -> Self {
        Self {
            client,
            credential,
            stage,
            instructions,
            requirements,
        }
    }

    pub fn build_messages(&self, profile: &FormatProfile, period_label: &str) -> Vec<ChatMessage> {
        let req = self.requirements;
        let thresholds = &profile.schema.thresholds;
        let mut prompt = String::new();

        prompt.push_str(&profile.schema.render());
        prompt.push_str("\n## Format analysis\n");
        prompt.push_str(&profile.analysis);
        prompt.push_str("\n\n## Content requirements\n");
        prompt.push_str(&format!("- Title: {}\n", req.title));
        prompt.push_str(&format!("- Reporting period: {}\n", period_label));
        prompt.push_str(&format!("- Audience: {}\n", req.audience));
        prompt.push_str(&format!("- Language: {}\n", req.language));
        prompt.push_str(&format!(
            "- At least {} sections, in this order: {}\n",
            thresholds.min_sections,
            req.sections.join("; ")
        ));
        prompt.push_str(&format!(
            "- At least {} news items in total, each with date, source, headline, summary and original link\n",
            thresholds.min_units
        ));
        prompt.push_str(&format!(
            "- At least {} outbound links, all opening in a new tab with an appropriate rel attribute\n",
            thresholds.min_links
        ));
        prompt.push_str(&format!(
            "- At least {} characters in total\n",
            thresholds.min_length
        ));
        if !req.prohibited_topics.is_empty() {
            prompt.push_str(&format!(
                "- Do not include: {}\n",
                req.prohibited_topics.join("; ")
            ));
        }
        prompt.push_str(&format!("- {}\n", req.annotation_rule));
        prompt.push_str(
            "\nOutput the complete document only, starting with <!DOCTYPE html>. \
             No markdown and no explanations.",
        );

        vec![ChatMessage::system(self.instructions), ChatMessage::user(prompt)]
    }

    pub async fn synthesize(
        &self,
        profile: &FormatProfile,
        period_label: &str,
    ) -> Result<String, PipelineError> {
        let request = self.stage.request(self.build_messages(profile, period_label));
        let response = self.client.complete(self.credential, request).await?;

        let text = unwrap_code_fence(&response.content);
        if text.is_empty() {
            return Err(PipelineError::service(
                ServiceErrorKind::MalformedResponse,
                "Synthesized document came back empty",
            ));
        }

        info!(
            model = %response.model,
            chars = text.chars().count(),
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            "Document synthesized"
        );
        Ok(text)
    }
}
