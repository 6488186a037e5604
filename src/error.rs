//! Error types shared across collaborators and the analysis pipeline
//!
//! `BackendError` covers failures of remote collaborators (news API, LLM
//! providers). `PipelineError` is the only error a pipeline run can return,
//! and `AnalysisError` is what callers of the service layer see.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to a remote collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BackendError {
    /// Request reached the service but it answered with a failure
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Authentication failed or credentials are invalid
    AuthenticationError { message: String },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// Rate limit exceeded, retry after the specified duration (in seconds)
    RateLimitError { retry_after: Option<u64> },

    /// Response body did not have the expected shape
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// Configuration error (missing API keys, invalid settings, etc.)
    ConfigurationError { message: String },

    /// Connection-level failure
    NetworkError { message: String },

    /// Generic error for other cases
    Other { message: String },
}

impl BackendError {
    /// Whether a retry has a reasonable chance of succeeding.
    ///
    /// Rate limits, timeouts, connection failures and 5xx answers are
    /// transient. Everything else is treated as permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::RateLimitError { .. }
            | BackendError::TimeoutError { .. }
            | BackendError::NetworkError { .. } => true,
            BackendError::ApiError { status_code, .. } => {
                matches!(status_code, Some(code) if *code >= 500)
            }
            _ => false,
        }
    }

    /// Server-provided wait hint, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            BackendError::RateLimitError {
                retry_after: Some(seconds),
            } => Some(Duration::from_secs(*seconds)),
            _ => None,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::AuthenticationError { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            BackendError::RateLimitError { retry_after } => {
                if let Some(seconds) = retry_after {
                    write!(f, "Rate limit exceeded, retry after {} seconds", seconds)
                } else {
                    write!(f, "Rate limit exceeded")
                }
            }
            BackendError::InvalidResponse { message, .. } => {
                write!(f, "Invalid response: {}", message)
            }
            BackendError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            BackendError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            BackendError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::TimeoutError { seconds: 0 }
        } else if err.is_connect() || err.is_request() {
            BackendError::NetworkError {
                message: err.to_string(),
            }
        } else if err.is_decode() {
            BackendError::InvalidResponse {
                message: err.to_string(),
                raw_response: None,
            }
        } else if let Some(status) = err.status() {
            BackendError::ApiError {
                message: err.to_string(),
                status_code: Some(status.as_u16()),
            }
        } else {
            BackendError::Other {
                message: err.to_string(),
            }
        }
    }
}

/// Errors that abort a pipeline run.
///
/// Degraded collaborators never produce one of these; stages fall back to
/// their documented defaults instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("contract violation in {stage}: {message}")]
    ContractViolation { stage: &'static str, message: String },
}

/// Errors surfaced to callers of the analysis service
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("company not found: {0}")]
    UnknownCompany(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("risk model not loaded")]
    ModelUnavailable,

    #[error("prediction failed: {0}")]
    Prediction(#[from] crate::model::ModelError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
