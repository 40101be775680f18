//! Stage 1: learn the reference document's format.

use crate::credential::Credential;
use crate::error::{PipelineError, ServiceErrorKind};
use crate::pipeline::StageConfig;
use crate::profile::{FormatProfile, LayoutSchema, ReferenceDocument};
use crate::provider::{ChatMessage, ModelProviderClient};
use crate::validation::ValidationConfig;
use tracing::{debug, info};

/// Submits the reference document with analysis instructions and returns the
/// service's description of its format.
pub struct FormatLearner<'a> {
    client: &'a dyn ModelProviderClient,
    credential: &'a Credential,
    stage: &'a StageConfig,
    instructions: &'a str,
    validation: &'a ValidationConfig,
}

impl<'a> FormatLearner<'a> {
    pub fn new(
        client: &'a dyn ModelProviderClient,
        credential: &'a Credential,
        stage: &'a StageConfig,
        instructions: &'a str,
        validation: &'a ValidationConfig,
    ) -> Self {
        Self {
            client,
            credential,
            stage,
            instructions,
            validation,
        }
    }

    pub fn build_messages(&self, reference: &ReferenceDocument) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.instructions),
            ChatMessage::user(format!(
                "Analyze the structure and visual design of the following reference document. \
                 Describe its layout, sections, repeated item blocks, CSS conventions and \
                 required assets so that a new document can reproduce the format exactly.\n\n\
                 --- REFERENCE DOCUMENT ---\n{}\n--- END REFERENCE DOCUMENT ---",
                reference.text()
            )),
        ]
    }

    pub async fn learn(&self, reference: &ReferenceDocument) -> Result<FormatProfile, PipelineError> {
        let schema = LayoutSchema::extract(reference, self.validation);
        if !schema.reference_missing.is_empty() {
            debug!(
                missing = ?schema.reference_missing,
                "Reference document lacks some required markers"
            );
        }

        let request = self.stage.request(self.build_messages(reference));
        let response = self.client.complete(self.credential, request).await?;

        let analysis = response.content.trim().to_string();
        if analysis.is_empty() {
            return Err(PipelineError::service(
                ServiceErrorKind::MalformedResponse,
                "Format analysis came back empty",
            ));
        }

        info!(
            model = %response.model,
            analysis_chars = analysis.chars().count(),
            completion_tokens = response.usage.completion_tokens,
            "Format profile learned"
        );

        Ok(FormatProfile { analysis, schema })
    }
}
