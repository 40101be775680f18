//! Model Provider Abstraction
//!
//! Contract with the generative text service: a request carries role-tagged
//! messages, an output budget, a sampling temperature and a timeout; a
//! response is either generated text or a classified [`ServiceErrorKind`].
//! The shipped client speaks the OpenAI-compatible chat completions API.

use crate::credential::Credential;
use crate::error::{PipelineError, ServiceErrorKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Completion options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>, // 0.0-2.0
    pub max_tokens: Option<u32>,  // Maximum tokens to generate
}

/// One call to the service
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub options: CompletionOptions,
    /// Upper bound for the whole round trip
    pub timeout: Duration,
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Model provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion; the credential is supplied per call and never stored.
    async fn complete(
        &self,
        credential: &Credential,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, PipelineError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Provider settings as they appear in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API; defaults to api.openai.com
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable the credential is read from
    #[serde(default = "default_credential_env")]
    pub credential_env: String,

    /// Prefix a well-formed credential starts with
    #[serde(default = "default_credential_prefix")]
    pub credential_prefix: String,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_credential_env() -> String {
    crate::credential::DEFAULT_CREDENTIAL_ENV_VAR.to_string()
}

fn default_credential_prefix() -> String {
    crate::credential::DEFAULT_CREDENTIAL_PREFIX.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: None,
            credential_env: default_credential_env(),
            credential_prefix: default_credential_prefix(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if self.credential_env.trim().is_empty() {
            return Err("Credential environment variable name cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "Endpoint must start with http:// or https://, got: {}",
                    endpoint
                ));
            }
        }
        Ok(())
    }
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

// Helper function to convert MessageRole to string
fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
    }
}

// Helper function to map transport errors to a service error
fn map_http_error(error: reqwest::Error) -> PipelineError {
    if error.is_timeout() {
        PipelineError::service(ServiceErrorKind::Timeout, format!("Request timeout: {}", error))
    } else if let Some(status) = error.status() {
        PipelineError::service(
            ServiceErrorKind::from_status(status.as_u16()),
            format!("Request failed with status {}: {}", status, error),
        )
    } else if error.is_connect() {
        PipelineError::service(ServiceErrorKind::Network, format!("Connection error: {}", error))
    } else {
        PipelineError::service(ServiceErrorKind::Network, format!("HTTP error: {}", error))
    }
}

/// Build the error for a non-success status. BadRequest bodies carry the
/// service's machine-readable message, which is kept verbatim.
pub fn status_error(status: u16, body: &str) -> PipelineError {
    let kind = ServiceErrorKind::from_status(status);
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let message = match kind {
        ServiceErrorKind::BadRequest => detail,
        ServiceErrorKind::Unauthorized => format!("API key invalid or expired: {}", detail),
        ServiceErrorKind::RateLimited => format!("Rate limit exceeded: {}", detail),
        _ => format!("Request failed with status {}: {}", status, detail),
    };
    PipelineError::service(kind, message)
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn build_provider_http_client() -> Result<Client, PipelineError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .build()
        .map_err(|e| PipelineError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

/// OpenAI provider client
pub struct OpenAIClient {
    client: Client,
    model: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(model: String, base_url: Option<String>) -> Result<Self, PipelineError> {
        let client = build_provider_http_client()?;
        let base_url = base_url
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            model,
            base_url,
        })
    }
}

#[async_trait]
impl ModelProviderClient for OpenAIClient {
    async fn complete(
        &self,
        credential: &Credential,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, PipelineError> {
        let openai_messages: Vec<OpenAIMessage> = request
            .messages
            .into_iter()
            .map(|msg| OpenAIMessage {
                role: role_to_string(msg.role).to_string(),
                content: Some(msg.content),
            })
            .collect();

        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: openai_messages,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.expose())
            .header("Content-Type", "application/json")
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status.as_u16(), &error_text));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                map_http_error(e)
            } else {
                PipelineError::service(
                    ServiceErrorKind::MalformedResponse,
                    format!("Failed to parse response: {}", e),
                )
            }
        })?;

        let choice = completion.choices.into_iter().next().ok_or_else(|| {
            PipelineError::service(
                ServiceErrorKind::MalformedResponse,
                "No choices in response",
            )
        })?;

        let usage = completion
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: completion.model,
            usage,
            finish_reason: choice.finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Factory for creating provider clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        config: &ProviderConfig,
    ) -> Result<Arc<dyn ModelProviderClient>, PipelineError> {
        config.validate().map_err(PipelineError::ConfigError)?;
        let client = OpenAIClient::new(config.model.clone(), config.endpoint.clone())?;
        Ok(Arc::new(client))
    }
}

// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<String, ServiceErrorKind>>>,
    requests: std::sync::Mutex<Vec<CompletionRequest>>,
    model_name: String,
}

#[cfg(test)]
impl MockProvider {
    pub fn new(responses: Vec<Result<String, ServiceErrorKind>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into_iter().collect()),
            requests: std::sync::Mutex::new(Vec::new()),
            model_name: "mock-model".to_string(),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ModelProviderClient for MockProvider {
    async fn complete(
        &self,
        _credential: &Credential,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, PipelineError> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Mock response".to_string()));
        match next {
            Ok(content) => Ok(CompletionResponse {
                content,
                model: self.model_name.clone(),
                usage: TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 20,
                    total_tokens: 30,
                },
                finish_reason: Some("stop".to_string()),
            }),
            Err(kind) => Err(PipelineError::service(kind, "mock failure")),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
