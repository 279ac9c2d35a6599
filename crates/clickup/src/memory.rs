//! In-memory [`TaskStore`] for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{ClickUpError, ClickUpResult};
use crate::models::{CustomField, FieldWrite, SubtaskRef, Task};
use crate::store::TaskStore;
use crate::task_ref::TaskRef;

/// A write accepted by [`MemoryTaskStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub task_id: String,
    pub field_id: String,
    pub write: FieldWrite,
}

/// Task store backed by a map, with a write log and failure injection.
///
/// Values are stored the way ClickUp returns them: relationships as lists of
/// `{"id": ...}` objects, dates as millisecond strings.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<String, Task>>,
    writes: Mutex<Vec<RecordedWrite>>,
    failing_fields: Mutex<HashSet<String>>,
    offline: Mutex<bool>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryTaskStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a task.
    pub fn insert(&self, task: Task) {
        lock(&self.tasks).insert(task.id.clone(), task);
    }

    /// Current snapshot of a task by canonical id.
    #[must_use]
    pub fn task(&self, id: &str) -> Option<Task> {
        lock(&self.tasks).get(id).cloned()
    }

    /// Every write accepted so far, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<RecordedWrite> {
        lock(&self.writes).clone()
    }

    /// Writes accepted for one task.
    #[must_use]
    pub fn writes_for(&self, task_id: &str) -> Vec<RecordedWrite> {
        lock(&self.writes)
            .iter()
            .filter(|w| w.task_id == task_id)
            .cloned()
            .collect()
    }

    /// Forget the write log (task state is kept).
    pub fn clear_writes(&self) {
        lock(&self.writes).clear();
    }

    /// Make every write to `field_id` fail with a 503.
    pub fn fail_field(&self, field_id: &str) {
        lock(&self.failing_fields).insert(field_id.to_string());
    }

    /// Stop failing writes to `field_id`.
    pub fn heal_field(&self, field_id: &str) {
        lock(&self.failing_fields).remove(field_id);
    }

    /// Make every call time out.
    pub fn set_offline(&self, offline: bool) {
        *lock(&self.offline) = offline;
    }

    fn check_online(&self) -> ClickUpResult<()> {
        if *lock(&self.offline) {
            Err(ClickUpError::Timeout)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn get_task(&self, task: &TaskRef) -> ClickUpResult<Task> {
        self.check_online()?;
        let tasks = lock(&self.tasks);
        let found = match task {
            TaskRef::Canonical(id) => tasks.get(id),
            TaskRef::Custom(alias) => tasks
                .values()
                .find(|t| t.custom_id.as_deref() == Some(alias.as_str())),
        };
        found
            .cloned()
            .ok_or_else(|| ClickUpError::NotFound(task.to_string()))
    }

    async fn get_task_with_subtasks(&self, task: &TaskRef) -> ClickUpResult<Task> {
        let mut found = self.get_task(task).await?;
        let tasks = lock(&self.tasks);
        let mut subtasks: Vec<SubtaskRef> = tasks
            .values()
            .filter(|t| t.parent.as_deref() == Some(found.id.as_str()))
            .map(|t| SubtaskRef {
                id: t.id.clone(),
                name: t.name.clone(),
            })
            .collect();
        subtasks.sort_by(|a, b| a.id.cmp(&b.id));
        found.subtasks = subtasks;
        Ok(found)
    }

    async fn set_field(
        &self,
        task_id: &str,
        field_id: &str,
        write: &FieldWrite,
    ) -> ClickUpResult<()> {
        self.check_online()?;
        if lock(&self.failing_fields).contains(field_id) {
            return Err(ClickUpError::Api {
                status: 503,
                message: format!("injected failure writing {field_id}"),
            });
        }

        let mut tasks = lock(&self.tasks);
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| ClickUpError::NotFound(task_id.to_string()))?;

        let existing = task.relation_ids(field_id);
        let value = match write {
            FieldWrite::Text(s) => Some(Value::String(s.clone())),
            FieldWrite::Dropdown(n) => Some(json!(n)),
            FieldWrite::Date(ms) => Some(Value::String(ms.to_string())),
            FieldWrite::AddRelations(ids) => {
                let mut merged = existing;
                for id in ids {
                    if !merged.contains(id) {
                        merged.push(id.clone());
                    }
                }
                Some(Value::Array(
                    merged.into_iter().map(|id| json!({ "id": id })).collect(),
                ))
            }
            FieldWrite::Raw(value) => Some(value.clone()),
            FieldWrite::Clear => None,
        };

        match task.custom_fields.iter_mut().find(|f| f.id == field_id) {
            Some(field) => field.value = value,
            None => task.custom_fields.push(CustomField {
                id: field_id.to_string(),
                value,
                ..CustomField::default()
            }),
        }
        drop(tasks);

        lock(&self.writes).push(RecordedWrite {
            task_id: task_id.to_string(),
            field_id: field_id.to_string(),
            write: write.clone(),
        });
        Ok(())
    }
}
