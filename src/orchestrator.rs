//! Retry Orchestrator
//!
//! Sequences Probe → Learn → Synthesize → Validate as an explicit state
//! machine. Any learn, synthesize or validation failure restarts the whole
//! stochastic pair from Learning, bounded by the retry budget. A probe failure
//! is never retried.
//!
//! ```text
//! Init → Probing → Learning → Synthesizing → Validating → Done
//!           │          │            │             │
//!           ▼          └────────────┴─────────────┴──▶ Retrying ──▶ Learning
//!         Failed                                   └─▶ Failed | Done (degraded)
//! ```

use crate::credential::Credential;
use crate::error::PipelineError;
use crate::pipeline::{ContentSynthesizer, FormatLearner, StagesConfig, SynthesisRequirements};
use crate::probe::ConnectivityProbe;
use crate::profile::ReferenceDocument;
use crate::provider::ModelProviderClient;
use crate::validation::{ContentValidator, GeneratedDocument, ValidationConfig, ValidationReport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What to do when the budget is spent and the last document still fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcceptancePolicy {
    /// Accept the last document, carrying its report as a warning
    BestEffort,
    /// Fail the run
    Strict,
}

impl AcceptancePolicy {
    pub fn parse(value: &str) -> Result<Self, PipelineError> {
        match value {
            "best-effort" => Ok(AcceptancePolicy::BestEffort),
            "strict" => Ok(AcceptancePolicy::Strict),
            other => Err(PipelineError::ConfigError(format!(
                "Invalid acceptance policy: {} (must be 'best-effort' or 'strict')",
                other
            ))),
        }
    }
}

/// Retry budget and pacing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional learn+synthesize attempts after the first
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Pause before re-entering Learning (milliseconds)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_policy")]
    pub policy: AcceptancePolicy,
}

fn default_max_retries() -> usize {
    2
}

fn default_delay_ms() -> u64 {
    5000
}

fn default_policy() -> AcceptancePolicy {
    AcceptancePolicy::BestEffort
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_delay_ms(),
            policy: default_policy(),
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries > 10 {
            return Err(format!(
                "max_retries must be at most 10, got {}",
                self.max_retries
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    Probing,
    Learning,
    Synthesizing,
    Validating,
    Retrying,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Init => "init",
            PipelineState::Probing => "probing",
            PipelineState::Learning => "learning",
            PipelineState::Synthesizing => "synthesizing",
            PipelineState::Validating => "validating",
            PipelineState::Retrying => "retrying",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attempt counter owned by one orchestrator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    /// 0-based; incremented only on entry to Retrying
    pub attempt: usize,
    pub max_retries: usize,
    pub last_failure: Option<String>,
}

impl RetryState {
    pub fn new(max_retries: usize) -> Self {
        Self {
            attempt: 0,
            max_retries,
            last_failure: None,
        }
    }

    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_retries
    }

    fn enter_retry(&mut self, reason: String) {
        self.attempt += 1;
        self.last_failure = Some(reason);
    }
}

/// Progress notifications for the terminal narrative
#[derive(Debug)]
pub enum PipelineEvent<'a> {
    Entered {
        state: PipelineState,
        retry: &'a RetryState,
    },
    StageFailed {
        state: PipelineState,
        error: &'a PipelineError,
    },
    Validated {
        report: &'a ValidationReport,
    },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: PipelineEvent<'_>);
}

/// Sink that ignores every event
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _event: PipelineEvent<'_>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acceptance {
    /// Passed validation
    Accepted,
    /// Accepted after exhausting retries, deficiencies unresolved
    Degraded,
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub document: GeneratedDocument,
    pub report: ValidationReport,
    pub acceptance: Acceptance,
    pub retry: RetryState,
    pub learn_calls: usize,
    pub synthesize_calls: usize,
    pub trace: Vec<PipelineState>,
}

/// Text inputs for a run
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub reference: ReferenceDocument,
    pub analysis_instructions: String,
    pub generation_instructions: String,
    pub period_label: String,
}

/// Everything the orchestrator needs besides the client
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub credential_prefix: String,
    pub stages: StagesConfig,
    pub validation: ValidationConfig,
    pub requirements: SynthesisRequirements,
    pub retry: RetryConfig,
}

impl From<&crate::config::BulletinConfig> for OrchestratorConfig {
    fn from(config: &crate::config::BulletinConfig) -> Self {
        Self {
            credential_prefix: config.provider.credential_prefix.clone(),
            stages: config.stages.clone(),
            validation: config.validation.clone(),
            requirements: config.content.clone(),
            retry: config.retry.clone(),
        }
    }
}

#[derive(Default)]
struct RunLedger {
    trace: Vec<PipelineState>,
    learn_calls: usize,
    synthesize_calls: usize,
}

pub struct RetryOrchestrator {
    client: Arc<dyn ModelProviderClient>,
    config: OrchestratorConfig,
    validator: ContentValidator,
}

impl RetryOrchestrator {
    pub fn new(client: Arc<dyn ModelProviderClient>, config: OrchestratorConfig) -> Self {
        let validator = ContentValidator::new(config.validation.clone());
        Self {
            client,
            config,
            validator,
        }
    }

    /// Run the pipeline to Done or Failed.
    pub async fn run(
        &self,
        credential: Option<&str>,
        inputs: &PipelineInputs,
        progress: &dyn ProgressSink,
    ) -> Result<RunOutcome, PipelineError> {
        let mut ledger = RunLedger::default();
        let mut retry = RetryState::new(self.config.retry.max_retries);

        self.enter(&mut ledger, PipelineState::Init, &retry, progress);
        self.enter(&mut ledger, PipelineState::Probing, &retry, progress);

        let credential = match Credential::parse(credential, &self.config.credential_prefix) {
            Ok(credential) => credential,
            Err(err) => return Err(self.fail(&mut ledger, PipelineState::Probing, err, &retry, progress)),
        };
        let probe = ConnectivityProbe::new(
            self.client.as_ref(),
            &self.config.stages.probe,
            &self.config.credential_prefix,
        );
        if !probe.reachable(&credential).await {
            let err = PipelineError::Connectivity(format!(
                "{} did not answer a minimal request with the supplied credential",
                self.client.provider_name()
            ));
            return Err(self.fail(&mut ledger, PipelineState::Probing, err, &retry, progress));
        }

        loop {
            match self.attempt(&credential, inputs, &mut ledger, &retry, progress).await {
                Ok((document, report)) if report.passed() => {
                    info!(attempt = retry.attempt, "Document accepted");
                    self.enter(&mut ledger, PipelineState::Done, &retry, progress);
                    return Ok(self.outcome(document, report, Acceptance::Accepted, retry, ledger));
                }
                Ok((document, report)) => {
                    if retry.can_retry() {
                        self.retry(&mut ledger, &mut retry, report.summary_line(), progress)
                            .await;
                        continue;
                    }
                    match self.config.retry.policy {
                        AcceptancePolicy::BestEffort => {
                            warn!(
                                attempts = retry.attempt + 1,
                                deficiencies = %report.summary_line(),
                                "Retries exhausted; accepting last document with warnings"
                            );
                            self.enter(&mut ledger, PipelineState::Done, &retry, progress);
                            return Ok(self.outcome(
                                document,
                                report,
                                Acceptance::Degraded,
                                retry,
                                ledger,
                            ));
                        }
                        AcceptancePolicy::Strict => {
                            let err = PipelineError::Validation {
                                report: Box::new(report),
                            };
                            return Err(self.fail(
                                &mut ledger,
                                PipelineState::Validating,
                                err,
                                &retry,
                                progress,
                            ));
                        }
                    }
                }
                Err((state, err)) => {
                    progress.emit(PipelineEvent::StageFailed {
                        state,
                        error: &err,
                    });
                    if err.is_retryable() && retry.can_retry() {
                        warn!(state = %state, error = %err, "Stage failed; retrying");
                        self.retry(&mut ledger, &mut retry, err.to_string(), progress)
                            .await;
                        continue;
                    }
                    return Err(self.fail(&mut ledger, state, err, &retry, progress));
                }
            }
        }
    }

    /// One Learning → Synthesizing → Validating pass
    async fn attempt(
        &self,
        credential: &Credential,
        inputs: &PipelineInputs,
        ledger: &mut RunLedger,
        retry: &RetryState,
        progress: &dyn ProgressSink,
    ) -> Result<(GeneratedDocument, ValidationReport), (PipelineState, PipelineError)> {
        self.enter(ledger, PipelineState::Learning, retry, progress);
        ledger.learn_calls += 1;
        let learner = FormatLearner::new(
            self.client.as_ref(),
            credential,
            &self.config.stages.learn,
            &inputs.analysis_instructions,
            &self.config.validation,
        );
        let profile = learner
            .learn(&inputs.reference)
            .await
            .map_err(|e| (PipelineState::Learning, e))?;

        self.enter(ledger, PipelineState::Synthesizing, retry, progress);
        ledger.synthesize_calls += 1;
        let synthesizer = ContentSynthesizer::new(
            self.client.as_ref(),
            credential,
            &self.config.stages.synthesize,
            &inputs.generation_instructions,
            &self.config.requirements,
        );
        let text = synthesizer
            .synthesize(&profile, &inputs.period_label)
            .await
            .map_err(|e| (PipelineState::Synthesizing, e))?;

        self.enter(ledger, PipelineState::Validating, retry, progress);
        let document = GeneratedDocument::new(text, &self.config.validation);
        let report = self.validator.validate(&document);
        if report.passed() {
            info!(
                units = report.metrics.units,
                sections = report.metrics.sections,
                links = report.metrics.links,
                length = report.metrics.length,
                "Validation passed"
            );
        } else {
            warn!(deficiencies = %report.summary_line(), "Validation failed");
        }
        progress.emit(PipelineEvent::Validated { report: &report });
        Ok((document, report))
    }

    async fn retry(
        &self,
        ledger: &mut RunLedger,
        retry: &mut RetryState,
        reason: String,
        progress: &dyn ProgressSink,
    ) {
        retry.enter_retry(reason);
        self.enter(ledger, PipelineState::Retrying, retry, progress);
        let delay = self.config.retry.delay();
        if !delay.is_zero() {
            debug!(delay_ms = self.config.retry.delay_ms, "Waiting before retry");
            tokio::time::sleep(delay).await;
        }
    }

    fn enter(
        &self,
        ledger: &mut RunLedger,
        state: PipelineState,
        retry: &RetryState,
        progress: &dyn ProgressSink,
    ) {
        debug!(state = %state, attempt = retry.attempt, "Pipeline state");
        ledger.trace.push(state);
        progress.emit(PipelineEvent::Entered { state, retry });
    }

    fn fail(
        &self,
        ledger: &mut RunLedger,
        state: PipelineState,
        err: PipelineError,
        retry: &RetryState,
        progress: &dyn ProgressSink,
    ) -> PipelineError {
        error!(state = %state, attempt = retry.attempt, error = %err, "Pipeline failed");
        self.enter(ledger, PipelineState::Failed, retry, progress);
        err
    }

    fn outcome(
        &self,
        document: GeneratedDocument,
        report: ValidationReport,
        acceptance: Acceptance,
        retry: RetryState,
        ledger: RunLedger,
    ) -> RunOutcome {
        RunOutcome {
            document,
            report,
            acceptance,
            retry,
            learn_calls: ledger.learn_calls,
            synthesize_calls: ledger.synthesize_calls,
            trace: ledger.trace,
        }
    }
}
