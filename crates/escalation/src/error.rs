//! Error types for escalation operations.

use clickup::ClickUpError;
use thiserror::Error;

use crate::fields::FieldKey;
use crate::state::{Action, EscalationState};

/// Errors returned by [`crate::EscalationService`].
#[derive(Debug, Error)]
pub enum EscalationError {
    /// Request input is missing or malformed
    #[error("{message}")]
    Validation { code: &'static str, message: String },

    /// Neither the task nor its ancestors carry a property link
    #[error("Task {task_id} has no property link and none could be copied from a parent task")]
    NoPropertyLink { task_id: String },

    /// Task does not exist
    #[error("Task not found: {0}")]
    NotFound(String),

    /// The action is not allowed from the current state
    #[error("Cannot {action} while escalation is {from}")]
    InvalidTransition {
        from: EscalationState,
        action: Action,
    },

    /// ClickUp failed
    #[error(transparent)]
    Upstream(ClickUpError),

    /// Stored field values do not decode to a known state
    #[error("Escalation record for task {task_id} is corrupt: {message}")]
    CorruptRecord { task_id: String, message: String },

    /// A multi-field transition failed part way through
    #[error("Failed writing {failed:?} on task {task_id} (rolled back: {rolled_back}): {source}")]
    PartialWrite {
        task_id: String,
        failed: FieldKey,
        rolled_back: bool,
        #[source]
        source: ClickUpError,
    },
}

impl EscalationError {
    pub(crate) fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    /// Machine-readable error code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { code, .. } => code,
            Self::NoPropertyLink { .. } => "NO_PROPERTY_LINK",
            Self::NotFound(_) => "TASK_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Upstream(e) if e.is_transient() => "UPSTREAM_UNAVAILABLE",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::CorruptRecord { .. } => "CORRUPT_RECORD",
            Self::PartialWrite { .. } => "PARTIAL_WRITE",
        }
    }
}

impl From<ClickUpError> for EscalationError {
    fn from(e: ClickUpError) -> Self {
        match e {
            ClickUpError::NotFound(id) => Self::NotFound(id),
            other => Self::Upstream(other),
        }
    }
}

/// Result alias for escalation operations.
pub type EscalationResult<T> = Result<T, EscalationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_lifted() {
        let err: EscalationError = ClickUpError::NotFound("868abc".to_string()).into();
        assert!(matches!(err, EscalationError::NotFound(ref id) if id == "868abc"));
        assert_eq!(err.code(), "TASK_NOT_FOUND");
    }

    #[test]
    fn test_upstream_codes() {
        let transient: EscalationError = ClickUpError::Timeout.into();
        assert_eq!(transient.code(), "UPSTREAM_UNAVAILABLE");

        let permanent: EscalationError = ClickUpError::Api {
            status: 400,
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(permanent.code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = EscalationError::InvalidTransition {
            from: EscalationState::Resolved,
            action: Action::RequestInfo,
        };
        assert_eq!(err.to_string(), "Cannot request_info while escalation is resolved");
    }
}
