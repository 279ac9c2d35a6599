//! HTTP handlers.

pub mod ai;
pub mod escalation;
pub mod health;
pub mod wait_node;

use clickup::TaskRef;
use tracing::warn;

use crate::error::ApiError;

/// Validate a task id taken from the request path.
pub(crate) fn task_ref(raw: &str) -> Result<TaskRef, ApiError> {
    TaskRef::parse(raw).map_err(|e| {
        warn!(task_id = raw, error = %e, "Rejected task id");
        ApiError::from(e)
    })
}
