//! Generation stages
//!
//! The two stochastic stages of a pipeline attempt: learning the format of the
//! reference document, then synthesizing a new document from that format.
//! Both share the same request/response handling; they differ in prompts and
//! in the budget each stage is granted.

use crate::provider::{ChatMessage, CompletionOptions, CompletionRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod learner;
pub mod synthesizer;

pub use learner::FormatLearner;
pub use synthesizer::{unwrap_code_fence, ContentSynthesizer, SynthesisRequirements};

/// Budget for one kind of service call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Output budget in tokens
    pub max_tokens: u32,

    /// Sampling temperature; unset leaves the service default
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Round-trip timeout in seconds
    pub timeout_secs: u64,
}

impl StageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than zero".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than zero".to_string());
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!("temperature must be within 0.0-2.0, got {}", temperature));
            }
        }
        Ok(())
    }

    /// Build a request under this stage's budget
    pub fn request(&self, messages: Vec<ChatMessage>) -> CompletionRequest {
        CompletionRequest {
            messages,
            options: CompletionOptions {
                temperature: self.temperature,
                max_tokens: Some(self.max_tokens),
            },
            timeout: self.timeout(),
        }
    }
}

/// Per-stage budgets: the probe is cheap and quick, learning is a short
/// summarization, synthesis produces the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagesConfig {
    #[serde(default = "default_probe")]
    pub probe: StageConfig,

    #[serde(default = "default_learn")]
    pub learn: StageConfig,

    #[serde(default = "default_synthesize")]
    pub synthesize: StageConfig,
}

fn default_probe() -> StageConfig {
    StageConfig {
        max_tokens: 10,
        temperature: None,
        timeout_secs: 30,
    }
}

fn default_learn() -> StageConfig {
    StageConfig {
        max_tokens: 2000,
        temperature: Some(0.2),
        timeout_secs: 60,
    }
}

fn default_synthesize() -> StageConfig {
    StageConfig {
        max_tokens: 12000,
        temperature: Some(0.3),
        timeout_secs: 120,
    }
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            probe: default_probe(),
            learn: default_learn(),
            synthesize: default_synthesize(),
        }
    }
}

impl StagesConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, stage) in [
            ("probe", &self.probe),
            ("learn", &self.learn),
            ("synthesize", &self.synthesize),
        ] {
            stage
                .validate()
                .map_err(|e| format!("stage '{}': {}", name, e))?;
        }
        Ok(())
    }
}
