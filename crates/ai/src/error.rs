//! Error types for LLM and workflow-engine calls.

use thiserror::Error;

/// Errors from AI providers and suggestion sources.
#[derive(Debug, Error)]
pub enum AiError {
    /// No API key or endpoint configured
    #[error("AI provider not configured: {0}")]
    NotConfigured(String),

    /// Request could not be sent or the connection failed
    #[error("AI request failed: {0}")]
    Request(String),

    /// Provider answered with a non-success status
    #[error("AI API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Provider answered successfully but produced no text
    #[error("AI response contained no text")]
    EmptyResponse,

    /// Call exceeded its time budget
    #[error("AI request timed out")]
    Timeout,

    /// Response body did not match the expected shape
    #[error("Failed to decode AI response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

impl From<tokio::time::error::Elapsed> for AiError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::Timeout
    }
}

/// Result alias for AI operations.
pub type AiResult<T> = Result<T, AiError>;
