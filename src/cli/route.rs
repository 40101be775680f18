//! CLI route: one dispatch table from parsed commands to domain services.

use crate::cli::parse::Commands;
use crate::cli::presentation::{format_report, format_run_summary, ConsoleProgress};
use crate::config::{BulletinConfig, ConfigLoader};
use crate::credential::Credential;
use crate::error::PipelineError;
use crate::orchestrator::{
    AcceptancePolicy, OrchestratorConfig, PipelineInputs, RetryOrchestrator,
};
use crate::persist::{FilePersister, SummaryContext};
use crate::probe::ConnectivityProbe;
use crate::prompts::{period_label, PromptSet};
use crate::provider::{ModelProviderClient, ProviderFactory};
use crate::validation::ContentValidator;
use chrono::{Local, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a command needs: the workspace, its configuration and, once
/// requested, a provider client.
pub struct RunContext {
    workspace_root: PathBuf,
    config: BulletinConfig,
    client: Option<Arc<dyn ModelProviderClient>>,
}

impl RunContext {
    /// Load and validate configuration for `workspace_root`.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PipelineError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };

        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PipelineError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(Self::from_config(workspace_root, config))
    }

    pub fn from_config(workspace_root: PathBuf, config: BulletinConfig) -> Self {
        Self {
            workspace_root,
            config,
            client: None,
        }
    }

    /// Use this client instead of building one from `[provider]`.
    pub fn with_client(mut self, client: Arc<dyn ModelProviderClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Apply a `--policy` override.
    pub fn with_policy(mut self, policy: Option<&str>) -> Result<Self, PipelineError> {
        if let Some(policy) = policy {
            self.config.retry.policy = AcceptancePolicy::parse(policy)?;
        }
        Ok(self)
    }

    pub fn config(&self) -> &BulletinConfig {
        &self.config
    }

    /// Diagnostic log for fatal errors
    pub fn error_log_path(&self) -> PathBuf {
        FilePersister::new(&self.config.output, &self.workspace_root)
            .error_log_path()
            .to_path_buf()
    }

    pub async fn execute(&self, command: &Commands) -> Result<String, PipelineError> {
        match command {
            Commands::Run => self.handle_run().await,
            Commands::Probe => self.handle_probe().await,
            Commands::Validate { path } => self.handle_validate(path),
        }
    }

    fn client(&self) -> Result<Arc<dyn ModelProviderClient>, PipelineError> {
        match self.client {
            Some(ref client) => Ok(Arc::clone(client)),
            None => ProviderFactory::create_client(&self.config.provider),
        }
    }

    /// Raw credential from the configured environment variable
    fn raw_credential(&self) -> Option<String> {
        std::env::var(&self.config.provider.credential_env).ok()
    }

    async fn handle_run(&self) -> Result<String, PipelineError> {
        let credential = Credential::from_env(
            &self.config.provider.credential_env,
            &self.config.provider.credential_prefix,
        )?;
        let prompts = PromptSet::load(&self.config.prompts, &self.workspace_root)?;
        let client = self.client()?;
        let model = client.model_name().to_string();
        let period = period_label(Local::now().date_naive());
        info!(period = %period, model = %model, "Starting bulletin run");

        let orchestrator =
            RetryOrchestrator::new(client, OrchestratorConfig::from(&self.config));
        let inputs = PipelineInputs {
            reference: prompts.reference,
            analysis_instructions: prompts.analysis_instructions,
            generation_instructions: prompts.generation_instructions,
            period_label: period.clone(),
        };

        let outcome = orchestrator
            .run(Some(credential.expose()), &inputs, &ConsoleProgress::new())
            .await?;

        let persister = FilePersister::new(&self.config.output, &self.workspace_root);
        let context = SummaryContext {
            period_label: period,
            model,
            acceptance: outcome.acceptance,
            attempts: outcome.learn_calls,
        };
        let receipt = persister.persist(
            &outcome.document.text,
            &outcome.report,
            &context,
            Utc::now(),
        )?;

        Ok(format_run_summary(&outcome, &receipt))
    }

    async fn handle_probe(&self) -> Result<String, PipelineError> {
        let client = self.client()?;
        let probe = ConnectivityProbe::new(
            client.as_ref(),
            &self.config.stages.probe,
            &self.config.provider.credential_prefix,
        );

        let credential = self.raw_credential();
        if probe.probe(credential.as_deref()).await? {
            Ok(format!(
                "Service reachable ({} / {})",
                client.provider_name(),
                client.model_name()
            ))
        } else {
            Err(PipelineError::Connectivity(format!(
                "{} did not answer the connectivity check",
                client.provider_name()
            )))
        }
    }

    fn handle_validate(&self, path: &Path) -> Result<String, PipelineError> {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };
        let text = std::fs::read_to_string(&resolved)?;
        let report = ContentValidator::new(self.config.validation.clone()).validate_text(&text);

        if report.passed() {
            Ok(format_report(&report))
        } else {
            Err(PipelineError::Validation {
                report: Box::new(report),
            })
        }
    }
}
