use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything that can end a classification run early.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Classifier returned HTTP {status_code}: {body}")]
    Remote { status_code: u16, body: String },

    #[error("Malformed classifier response: {0}")]
    MalformedResponse(String),

    #[error("A classification run is already in progress")]
    Busy,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Cloneable summary of a [`PipelineError`], carried by `PipelineState::Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    PermissionDenied,
    Encode,
    Network,
    Remote { status_code: u16 },
    MalformedResponse,
    Busy,
    Config,
}

impl PipelineError {
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            PipelineError::Encode(_) => ErrorKind::Encode,
            PipelineError::Network(_) => ErrorKind::Network,
            PipelineError::Remote { status_code, .. } => ErrorKind::Remote {
                status_code: *status_code,
            },
            PipelineError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            PipelineError::Busy => ErrorKind::Busy,
            PipelineError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether re-triggering the pipeline could plausibly succeed.
    /// Nothing retries automatically; this only drives the retry affordance.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            PipelineError::PermissionDenied(_) | PipelineError::Config(_)
        )
    }
}

pub const PERMISSION_REMEDIATION: &str = "Sorry, we need camera permissions to take a photo!";

/// User-visible failure state produced at the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppError {
    pub title: String,
    pub message: String,
    pub retryable: bool,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

impl From<&PipelineError> for AppError {
    fn from(err: &PipelineError) -> Self {
        let retryable = err.is_retryable();
        let (title, message) = match err {
            PipelineError::PermissionDenied(_) => {
                ("Permission Required", PERMISSION_REMEDIATION.to_string())
            }
            PipelineError::Encode(_) => (
                "Error",
                "The selected image could not be read. Try another photo.".to_string(),
            ),
            PipelineError::Network(e) => ("Error", e.to_string()),
            PipelineError::Remote { status_code, body } => {
                ("Error", format!("HTTP {}: {}", status_code, body))
            }
            PipelineError::MalformedResponse(_) => (
                "Error",
                "The classifier returned an unexpected response.".to_string(),
            ),
            PipelineError::Busy => (
                "Busy",
                "A classification is already in progress.".to_string(),
            ),
            PipelineError::Config(msg) => ("Configuration", msg.clone()),
        };
        AppError {
            title: title.to_string(),
            message,
            retryable,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::from(&err)
    }
}
