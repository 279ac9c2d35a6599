//! Wait-node page operations.
//!
//! Initialization gathers everything the page renders in one call. Approval
//! writes the submitted fields concurrently and, once all of them landed,
//! re-reads the task so the page shows what ClickUp actually stored. Failed
//! writes are reported per field and are not rolled back; the page resubmits.

use std::sync::Arc;
use std::time::Duration;

use clickup::{ClickUpError, FieldWrite, Task, TaskRef, TaskStore};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use crate::error::{FieldFailure, WaitNodeError, WaitNodeResult};
use crate::fields::{WaitField, WaitNodeFields};
use crate::hierarchy::{self, DEFAULT_MAX_DEPTH, PROCESS_LIBRARY_TYPE};

/// Pause before the verifying re-read after an approval.
pub const DEFAULT_VERIFY_DELAY: Duration = Duration::from_secs(1);

/// Everything the wait-node page needs to render.
#[derive(Debug, Clone, Serialize)]
pub struct WaitNodeView {
    /// Top of the process-library chain.
    pub root_task: Task,
    /// The task the page was opened for.
    pub wait_task: Task,
    /// Business task at the top of the tree.
    pub main_task: Task,
    /// Steps under the root, in step-number order.
    pub subtasks: Vec<Task>,
}

/// Result of a fully applied approval.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    /// Task as re-read after the writes.
    pub task: Task,
    /// Field ids written, in request order.
    pub updates: Vec<String>,
}

/// Wait-node operations over a task store.
pub struct WaitNodeService {
    store: Arc<dyn TaskStore>,
    fields: WaitNodeFields,
    library_type: u64,
    max_depth: u32,
    verify_delay: Duration,
}

impl WaitNodeService {
    /// Create a service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TaskStore>, fields: WaitNodeFields) -> Self {
        Self {
            store,
            fields,
            library_type: PROCESS_LIBRARY_TYPE,
            max_depth: DEFAULT_MAX_DEPTH,
            verify_delay: DEFAULT_VERIFY_DELAY,
        }
    }

    /// Custom task type that marks process-library tasks.
    #[must_use]
    pub const fn with_library_type(mut self, library_type: u64) -> Self {
        self.library_type = library_type;
        self
    }

    /// How many ancestors hierarchy walks may visit.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Pause between the last approval write and the verifying re-read.
    #[must_use]
    pub const fn with_verify_delay(mut self, delay: Duration) -> Self {
        self.verify_delay = delay;
        self
    }

    #[must_use]
    pub fn fields(&self) -> &WaitNodeFields {
        &self.fields
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch a task, optionally with its subtask list.
    #[instrument(skip(self), fields(task = %task))]
    pub async fn task(&self, task: &TaskRef, include_subtasks: bool) -> WaitNodeResult<Task> {
        let task = if include_subtasks {
            self.store.get_task_with_subtasks(task).await?
        } else {
            self.store.get_task(task).await?
        };
        Ok(task)
    }

    /// Root of the process-library chain above `task`.
    #[instrument(skip(self), fields(task = %task))]
    pub async fn process_root(&self, task: &TaskRef) -> WaitNodeResult<Task> {
        let start = self.store.get_task(task).await?;
        self.root_for(&start).await
    }

    /// Subtasks of `task` with their custom fields, in step-number order.
    #[instrument(skip(self), fields(task = %task))]
    pub async fn subtasks(&self, task: &TaskRef) -> WaitNodeResult<Vec<Task>> {
        let parent = self.store.get_task_with_subtasks(task).await?;
        self.detailed_subtasks(&parent).await
    }

    /// Root, wait task, main task and ordered steps in one call.
    #[instrument(skip(self), fields(task = %task))]
    pub async fn initialize(&self, task: &TaskRef) -> WaitNodeResult<WaitNodeView> {
        let wait_task = self.store.get_task(task).await?;
        let root_task = self.root_for(&wait_task).await?;
        let main_task =
            hierarchy::find_main_parent(self.store.as_ref(), &wait_task, self.max_depth).await?;
        let root_with_subtasks = self
            .store
            .get_task_with_subtasks(&TaskRef::Canonical(root_task.id.clone()))
            .await?;
        let subtasks = self.detailed_subtasks(&root_with_subtasks).await?;

        info!(
            wait_task = %wait_task.id,
            root_task = %root_task.id,
            main_task = %main_task.id,
            steps = subtasks.len(),
            "Wait node initialized"
        );
        Ok(WaitNodeView {
            root_task,
            wait_task,
            main_task,
            subtasks,
        })
    }

    async fn root_for(&self, start: &Task) -> WaitNodeResult<Task> {
        hierarchy::find_process_root(self.store.as_ref(), start, self.library_type, self.max_depth)
            .await?
            .ok_or_else(|| WaitNodeError::NoProcessRoot {
                task_id: start.id.clone(),
            })
    }

    /// Fetch every listed subtask concurrently and order by step number.
    ///
    /// Steps without a usable number sort first, as step 0; ties keep the
    /// order ClickUp listed them in.
    async fn detailed_subtasks(&self, parent: &Task) -> WaitNodeResult<Vec<Task>> {
        let mut set = JoinSet::new();
        for (index, subtask) in parent.subtasks.iter().enumerate() {
            let store = Arc::clone(&self.store);
            let id = subtask.id.clone();
            set.spawn(async move {
                let result = store.get_task(&TaskRef::Canonical(id.clone())).await;
                (index, id, result)
            });
        }

        let step_field = self.fields.id(WaitField::StepNumber);
        let mut steps = Vec::with_capacity(parent.subtasks.len());
        while let Some(joined) = set.join_next().await {
            let (index, id, result) = joined?;
            match result {
                Ok(task) => {
                    let step = task.number_field(step_field).unwrap_or(0.0);
                    steps.push((step, index, task));
                }
                Err(ClickUpError::NotFound(_)) => {
                    warn!(parent = %parent.id, subtask = %id, "Listed subtask not found");
                }
                Err(e) => return Err(e.into()),
            }
        }

        steps.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        Ok(steps.into_iter().map(|(_, _, task)| task).collect())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write every submitted field, then return the re-read task.
    ///
    /// `approvals` maps field UUIDs to the values the page collected. Every
    /// key must be a wait-node field; nothing is written otherwise.
    #[instrument(skip(self, approvals), fields(task = %task, fields = approvals.len()))]
    pub async fn approve(
        &self,
        task: &TaskRef,
        approvals: &Map<String, Value>,
    ) -> WaitNodeResult<ApprovalOutcome> {
        if approvals.is_empty() {
            return Err(WaitNodeError::NoApprovalData);
        }
        self.check_fields(approvals.keys().map(String::as_str))?;
        let canonical = self.store.get_task(task).await?.id;

        let mut set = JoinSet::new();
        for (index, (field_id, value)) in approvals.iter().enumerate() {
            let store = Arc::clone(&self.store);
            let (task_id, field_id) = (canonical.clone(), field_id.clone());
            let write = FieldWrite::Raw(value.clone());
            set.spawn(async move {
                let result = store.set_field(&task_id, &field_id, &write).await;
                (index, field_id, result)
            });
        }

        let mut updated = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, field_id, Ok(()))) => updated.push((index, field_id)),
                Ok((index, field_id, Err(e))) => failures.push((
                    index,
                    FieldFailure {
                        field_id,
                        error: e.to_string(),
                    },
                )),
                Err(e) => return Err(e.into()),
            }
        }
        updated.sort_by_key(|(index, _)| *index);
        failures.sort_by_key(|(index, _)| *index);
        let updates: Vec<String> = updated.into_iter().map(|(_, id)| id).collect();

        if !failures.is_empty() {
            let failures: Vec<FieldFailure> = failures.into_iter().map(|(_, f)| f).collect();
            error!(
                task_id = %canonical,
                failed = failures.len(),
                written = updates.len(),
                "Approval partially applied"
            );
            return Err(WaitNodeError::PartialApproval {
                task_id: canonical,
                failures,
                updated: updates,
            });
        }

        if !self.verify_delay.is_zero() {
            tokio::time::sleep(self.verify_delay).await;
        }
        let task = self
            .store
            .get_task(&TaskRef::Canonical(canonical.clone()))
            .await?;

        info!(task_id = %canonical, fields = updates.len(), "Approval applied");
        Ok(ApprovalOutcome { task, updates })
    }

    /// Write one wait-node field with a raw value.
    #[instrument(skip(self, value), fields(task = %task, field_id = %field_id))]
    pub async fn update_field(
        &self,
        task: &TaskRef,
        field_id: &str,
        value: Option<Value>,
    ) -> WaitNodeResult<String> {
        let value = value.ok_or(WaitNodeError::ValueRequired)?;
        self.check_fields([field_id])?;
        let canonical = self.store.get_task(task).await?.id;

        self.store
            .set_field(&canonical, field_id, &FieldWrite::Raw(value))
            .await?;
        info!(task_id = %canonical, "Wait-node field updated");
        Ok(canonical)
    }

    fn check_fields<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> WaitNodeResult<()> {
        for id in ids {
            if self.fields.key_of(id).is_none() {
                return Err(WaitNodeError::UnknownField(id.to_string()));
            }
        }
        Ok(())
    }
}
