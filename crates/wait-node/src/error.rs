//! Error types for wait-node operations.

use clickup::ClickUpError;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinError;

/// A field write that failed during an approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub field_id: String,
    pub error: String,
}

/// Errors returned by [`crate::WaitNodeService`].
#[derive(Debug, Error)]
pub enum WaitNodeError {
    /// The approval body carried no fields
    #[error("No approval data provided")]
    NoApprovalData,

    /// A write targeted a field outside the wait-node field map
    #[error("Field {0} is not a wait-node field")]
    UnknownField(String),

    /// A single field update came without a value
    #[error("Value is required")]
    ValueRequired,

    /// Neither the task nor its ancestors are process-library tasks
    #[error("Could not find Process Library root task for {task_id}")]
    NoProcessRoot { task_id: String },

    /// Task does not exist
    #[error("Task not found: {0}")]
    NotFound(String),

    /// ClickUp failed
    #[error(transparent)]
    Upstream(ClickUpError),

    /// A concurrent fetch or write task panicked or was cancelled
    #[error("Background ClickUp call aborted: {0}")]
    Aborted(#[from] JoinError),

    /// Some approval fields were written and others were not
    #[error(
        "{} of {} approval fields failed on task {task_id}",
        .failures.len(),
        .failures.len() + .updated.len()
    )]
    PartialApproval {
        task_id: String,
        failures: Vec<FieldFailure>,
        updated: Vec<String>,
    },
}

impl WaitNodeError {
    /// Machine-readable error code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoApprovalData => "NO_APPROVAL_DATA",
            Self::UnknownField(_) => "UNKNOWN_FIELD",
            Self::ValueRequired => "VALUE_REQUIRED",
            Self::NoProcessRoot { .. } => "NO_PROCESS_ROOT",
            Self::NotFound(_) => "TASK_NOT_FOUND",
            Self::Upstream(e) if e.is_transient() => "UPSTREAM_UNAVAILABLE",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Aborted(_) => "INTERNAL_ERROR",
            Self::PartialApproval { .. } => "PARTIAL_APPROVAL",
        }
    }
}

impl From<ClickUpError> for WaitNodeError {
    fn from(e: ClickUpError) -> Self {
        match e {
            ClickUpError::NotFound(id) => Self::NotFound(id),
            other => Self::Upstream(other),
        }
    }
}

/// Result type for wait-node operations
pub type WaitNodeResult<T> = Result<T, WaitNodeError>;
