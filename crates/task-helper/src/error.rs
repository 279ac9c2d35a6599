//! HTTP error responses.

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::http::header::RETRY_AFTER;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clickup::{ClickUpError, InvalidTaskRef};
use escalation::EscalationError;
use serde_json::json;
use thiserror::Error;
use wait_node::WaitNodeError;

use crate::rate_limit::RateLimitError;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Too many requests, retry in {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Invalid request body: {message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error("Invalid task id: {0}")]
    InvalidTaskId(String),

    #[error(transparent)]
    Escalation(#[from] EscalationError),

    #[error(transparent)]
    WaitNode(#[from] WaitNodeError),
}

impl From<RateLimitError> for ApiError {
    fn from(e: RateLimitError) -> Self {
        match e {
            RateLimitError::LimitExceeded { retry_after, .. } => Self::RateLimited { retry_after },
        }
    }
}

impl From<InvalidTaskRef> for ApiError {
    fn from(e: InvalidTaskRef) -> Self {
        Self::InvalidTaskId(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

fn upstream_status(e: &ClickUpError) -> StatusCode {
    if e.is_transient() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidBody { status, .. } => *status,
            Self::InvalidTaskId(_) => StatusCode::BAD_REQUEST,
            Self::Escalation(e) => match e {
                EscalationError::Validation { .. } | EscalationError::NoPropertyLink { .. } => {
                    StatusCode::BAD_REQUEST
                }
                EscalationError::NotFound(_) => StatusCode::NOT_FOUND,
                EscalationError::InvalidTransition { .. } => StatusCode::CONFLICT,
                EscalationError::Upstream(source)
                | EscalationError::PartialWrite { source, .. } => upstream_status(source),
                EscalationError::CorruptRecord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::WaitNode(e) => match e {
                WaitNodeError::NoApprovalData
                | WaitNodeError::UnknownField(_)
                | WaitNodeError::ValueRequired => StatusCode::BAD_REQUEST,
                WaitNodeError::NoProcessRoot { .. } | WaitNodeError::NotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                WaitNodeError::Upstream(source) => upstream_status(source),
                WaitNodeError::Aborted(_) | WaitNodeError::PartialApproval { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::InvalidBody { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                "BODY_TOO_LARGE"
            }
            Self::InvalidBody { .. } => "INVALID_BODY",
            Self::InvalidTaskId(_) => "INVALID_TASK_ID",
            Self::Escalation(e) => e.code(),
            Self::WaitNode(e) => e.code(),
        }
    }

    /// Message shown to the user.
    fn message(&self) -> String {
        match self {
            _ if self.status() == StatusCode::SERVICE_UNAVAILABLE => {
                "ClickUp is temporarily unavailable. Please try again in a moment.".to_string()
            }
            Self::WaitNode(WaitNodeError::PartialApproval { .. }) => {
                "Some approval fields could not be saved. Please submit again.".to_string()
            }
            _ if self.status() == StatusCode::INTERNAL_SERVER_ERROR => {
                "An unexpected error occurred. Please contact support if it persists.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Operator-facing detail, only for failures the user cannot fix.
    fn technical_error(&self) -> Option<String> {
        match self {
            Self::Escalation(
                e @ (EscalationError::Upstream(_)
                | EscalationError::PartialWrite { .. }
                | EscalationError::CorruptRecord { .. }),
            ) => Some(e.to_string()),
            Self::WaitNode(
                e @ (WaitNodeError::Upstream(_)
                | WaitNodeError::Aborted(_)
                | WaitNodeError::PartialApproval { .. }),
            ) => Some(e.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "success": false,
            "error": self.code(),
            "message": self.message(),
        });
        if let Some(detail) = self.technical_error() {
            body["technical_error"] = json!(detail);
        }
        if let Self::WaitNode(WaitNodeError::PartialApproval {
            failures, updated, ..
        }) = &self
        {
            body["errors"] = json!(failures);
            body["partial_updates"] = json!(updated);
        }

        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, retry_after.as_secs().max(1).into());
        }
        response
    }
}
