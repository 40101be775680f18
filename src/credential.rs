//! Service credential: read once from the environment, held only in memory.

use crate::error::PipelineError;
use std::fmt;

/// Default environment variable holding the service key
pub const DEFAULT_CREDENTIAL_ENV_VAR: &str = "OPENAI_API_KEY";

/// Default prefix every well-formed key starts with
pub const DEFAULT_CREDENTIAL_PREFIX: &str = "sk-";

/// Opaque, validated secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Check a raw value: present, non-blank, carrying the expected prefix.
    pub fn parse(raw: Option<&str>, prefix: &str) -> Result<Self, PipelineError> {
        let value = raw.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(PipelineError::Credential(
                "no API key supplied".to_string(),
            ));
        }
        if !value.starts_with(prefix) {
            return Err(PipelineError::Credential(format!(
                "API key is malformed (expected prefix '{}')",
                prefix
            )));
        }
        if value.len() == prefix.len() {
            return Err(PipelineError::Credential(
                "API key has no content after its prefix".to_string(),
            ));
        }
        Ok(Self(value.to_string()))
    }

    /// Read and check the credential from `var`.
    pub fn from_env(var: &str, prefix: &str) -> Result<Self, PipelineError> {
        let raw = std::env::var(var).ok();
        Self::parse(raw.as_deref(), prefix).map_err(|err| match err {
            PipelineError::Credential(msg) => {
                PipelineError::Credential(format!("{} (environment variable {})", msg, var))
            }
            other => other,
        })
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.0.chars().take(3).collect();
        write!(f, "{}***", visible)
    }
}
