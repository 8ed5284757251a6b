//! Application error types
//!
//! Unified error handling for binaries and adapters built on the synchronizer.

use ama_core::SyncError;
use serde::Serialize;
use std::fmt;

use crate::config::ConfigError;
use crate::telemetry::TracingError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Sync errors (network, anomalies, lifecycle)
    #[error(transparent)]
    Sync(#[from] SyncError),

    // Input errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    // Telemetry errors
    #[error(transparent)]
    Telemetry(#[from] TracingError),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get error code for logs and notices
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Sync(e) => e.code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Telemetry(_) => "TELEMETRY_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if retrying may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Sync(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Short user-facing text for a notice, if this error should be shown at all
    #[must_use]
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Sync(SyncError::TransientNetwork(_)) => {
                Some("Request failed, please try again")
            }
            Self::Sync(SyncError::ChannelDegraded { .. }) => {
                Some("Live updates are unavailable, the room may be out of date")
            }
            Self::Sync(SyncError::SessionClosed) => Some("You left the room"),
            Self::Validation(_) => Some("Please check your input"),
            _ => None,
        }
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Error body for machine-readable output (e.g. `--json` logs)
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
            notice: err.notice().map(str::to_string),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
