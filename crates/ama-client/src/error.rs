//! Adapter errors

use ama_common::AppError;
use ama_core::SyncError;

/// Errors raised by the HTTP and websocket adapters
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

impl ApiError {
    /// Check if the server rejected the request as malformed or unknown
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if (400..500).contains(status))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ApiError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(err.to_string())
    }
}

// The synchronizer treats every adapter failure as transient, except payloads it
// cannot read.
impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Http(e) if e.is_decode() => SyncError::decode(e.to_string()),
            ApiError::WebSocket(msg) => SyncError::ChannelDrop(msg),
            other => SyncError::network(other.to_string()),
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(e) => AppError::validation(e),
            ApiError::Url(msg) => AppError::internal(anyhow::anyhow!("invalid URL: {msg}")),
            other => AppError::Sync(SyncError::from(other)),
        }
    }
}

/// Result type for adapter operations
pub type ApiResult<T> = Result<T, ApiError>;
