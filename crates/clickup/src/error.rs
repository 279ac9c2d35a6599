//! Error types for the ClickUp client.

use thiserror::Error;

/// Errors returned by ClickUp API operations.
#[derive(Debug, Error)]
pub enum ClickUpError {
    /// The task (or custom field) does not exist or is not visible to the token
    #[error("Task not found: {0}")]
    NotFound(String),

    /// ClickUp answered with a non-success status
    #[error("ClickUp API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by ClickUp
    #[error("Rate limited by ClickUp, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The request did not complete within the configured timeout
    #[error("ClickUp request timed out")]
    Timeout,

    /// Connection-level failure (DNS, TLS, reset)
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Failed to decode ClickUp response: {0}")]
    Decode(String),

    /// Client could not be constructed
    #[error("Invalid ClickUp configuration: {0}")]
    Config(String),
}

impl ClickUpError {
    /// Whether the failure is worth retrying.
    ///
    /// Timeouts, transport errors, 429 and 5xx are transient; every other
    /// 4xx means the request itself is wrong and will fail again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Decode(_) | Self::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClickUpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e)
        }
    }
}

/// Result alias for ClickUp operations.
pub type ClickUpResult<T> = Result<T, ClickUpError>;
