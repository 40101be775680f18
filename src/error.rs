//! Error types for the bulletin generation pipeline.

use crate::validation::ValidationReport;
use std::fmt;
use thiserror::Error;

/// Classification of a failed call to the generative service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// 400: the request was rejected; the body message is kept verbatim
    BadRequest,
    /// 401: credential rejected by the service
    Unauthorized,
    /// 429: request quota exceeded
    RateLimited,
    /// 5xx
    ServerError,
    /// No response within the stage timeout
    Timeout,
    /// Connection could not be established or was dropped
    Network,
    /// Success status with a body that could not be used
    MalformedResponse,
}

impl ServiceErrorKind {
    /// Map a non-success HTTP status to a kind.
    ///
    /// Statuses outside the well-known set fold into the nearest class:
    /// other 4xx are treated as a rejected request, anything else as a
    /// server-side failure.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ServiceErrorKind::BadRequest,
            401 | 403 => ServiceErrorKind::Unauthorized,
            429 => ServiceErrorKind::RateLimited,
            402..=499 => ServiceErrorKind::BadRequest,
            _ => ServiceErrorKind::ServerError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceErrorKind::BadRequest => "bad_request",
            ServiceErrorKind::Unauthorized => "unauthorized",
            ServiceErrorKind::RateLimited => "rate_limited",
            ServiceErrorKind::ServerError => "server_error",
            ServiceErrorKind::Timeout => "timeout",
            ServiceErrorKind::Network => "network",
            ServiceErrorKind::MalformedResponse => "malformed_response",
        }
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline errors, from credential checks through persistence
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Connectivity check failed: {0}")]
    Connectivity(String),

    #[error("Service error ({kind}): {message}")]
    Service {
        kind: ServiceErrorKind,
        message: String,
    },

    #[error("Validation failed: {}", .report.summary_line())]
    Validation { report: Box<ValidationReport> },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn service(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        PipelineError::Service {
            kind,
            message: message.into(),
        }
    }

    /// Service kind, when this is a service error
    pub fn service_kind(&self) -> Option<ServiceErrorKind> {
        match self {
            PipelineError::Service { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Learn/synthesize failures and validation failures may be retried
    /// within the budget; everything else aborts the run.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Service { .. } | PipelineError::Validation { .. }
        )
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::ConfigError(err.to_string())
    }
}
