//! Storage seam between the escalation engine and ClickUp.

use async_trait::async_trait;

use crate::error::ClickUpResult;
use crate::models::{FieldWrite, Task};
use crate::task_ref::TaskRef;

/// Read and write access to tasks and their custom fields.
///
/// [`crate::ClickUpClient`] is the production implementation. Tests use
/// `MemoryTaskStore` (feature `test-util`).
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch a task, resolving custom aliases.
    async fn get_task(&self, task: &TaskRef) -> ClickUpResult<Task>;

    /// Fetch a task with [`Task::subtasks`] filled in.
    async fn get_task_with_subtasks(&self, task: &TaskRef) -> ClickUpResult<Task>;

    /// Write one custom field on the task with canonical id `task_id`.
    async fn set_field(&self, task_id: &str, field_id: &str, write: &FieldWrite)
        -> ClickUpResult<()>;
}
