//! Connectivity probe: one cheap round trip before the expensive pipeline.

use crate::credential::Credential;
use crate::error::PipelineError;
use crate::pipeline::StageConfig;
use crate::provider::{ChatMessage, ModelProviderClient};
use tracing::{info, warn};

const PROBE_PROMPT: &str = "Say hello";

pub struct ConnectivityProbe<'a> {
    client: &'a dyn ModelProviderClient,
    stage: &'a StageConfig,
    credential_prefix: &'a str,
}

impl<'a> ConnectivityProbe<'a> {
    pub fn new(
        client: &'a dyn ModelProviderClient,
        stage: &'a StageConfig,
        credential_prefix: &'a str,
    ) -> Self {
        Self {
            client,
            stage,
            credential_prefix,
        }
    }

    /// Check the credential, then the service.
    ///
    /// A missing or malformed credential is an error and no request is made.
    /// An unreachable service is `Ok(false)`; the caller decides whether that
    /// is fatal.
    pub async fn probe(&self, credential: Option<&str>) -> Result<bool, PipelineError> {
        let credential = Credential::parse(credential, self.credential_prefix)?;
        Ok(self.reachable(&credential).await)
    }

    /// One minimal request with the probe budget. Any failure yields `false`.
    pub async fn reachable(&self, credential: &Credential) -> bool {
        let request = self.stage.request(vec![ChatMessage::user(PROBE_PROMPT)]);
        match self.client.complete(credential, request).await {
            Ok(response) => {
                info!(
                    provider = self.client.provider_name(),
                    model = %response.model,
                    "Provider reachable"
                );
                true
            }
            Err(err) => {
                warn!(
                    provider = self.client.provider_name(),
                    model = self.client.model_name(),
                    error = %err,
                    "Provider connectivity check failed"
                );
                false
            }
        }
    }
}
