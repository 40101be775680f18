//! Configuration System
//!
//! Layered configuration: built-in defaults, the user's global file, the
//! workspace files, then `BULLETIN__*` environment overrides. Every knob the
//! pipeline reads (stage budgets, validation thresholds and markers, content
//! requirements, retry policy, artifact paths) lives here.

use crate::logging::LoggingConfig;
use crate::orchestrator::RetryConfig;
use crate::persist::OutputConfig;
use crate::pipeline::{StagesConfig, SynthesisRequirements};
use crate::prompts::PromptConfig;
use crate::provider::ProviderConfig;
use crate::validation::ValidationConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulletinConfig {
    /// Generative service settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Per-stage request budgets
    #[serde(default)]
    pub stages: StagesConfig,

    /// Validator thresholds and markers
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Content requirements stated to the synthesizer
    #[serde(default)]
    pub content: SynthesisRequirements,

    /// Retry budget and acceptance policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Artifact locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Reference document and instruction sources
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Provider(String),
    Stages(String),
    Validation(String),
    Retry(String),
    Output(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Stages(msg) => write!(f, "Stages: {}", msg),
            ValidationError::Validation(msg) => write!(f, "Validation: {}", msg),
            ValidationError::Retry(msg) => write!(f, "Retry: {}", msg),
            ValidationError::Output(msg) => write!(f, "Output: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl BulletinConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.stages.validate() {
            errors.push(ValidationError::Stages(e));
        }
        if let Err(e) = self.validation.validate() {
            errors.push(ValidationError::Validation(e));
        }
        if let Err(e) = self.retry.validate() {
            errors.push(ValidationError::Retry(e));
        }
        if let Err(e) = self.output.validate() {
            errors.push(ValidationError::Output(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
