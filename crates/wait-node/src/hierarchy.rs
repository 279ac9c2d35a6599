//! Walks up the subtask tree of a wait task.
//!
//! A wait task sits somewhere below a chain of process-library tasks (custom
//! task type [`PROCESS_LIBRARY_TYPE`]), which in turn sits below the business
//! task the process runs for. Both walks follow the direct `parent` link only
//! and stop after `max_depth` hops or when a task repeats.

use std::collections::HashSet;

use clickup::{ClickUpError, Task, TaskRef, TaskStore};
use tracing::{debug, warn};

use crate::error::WaitNodeResult;

/// Custom task type of process-library tasks.
pub const PROCESS_LIBRARY_TYPE: u64 = 1018;

/// Ancestors visited before a walk gives up.
pub const DEFAULT_MAX_DEPTH: u32 = 16;

fn direct_parent(task: &Task) -> Option<&str> {
    task.parent
        .as_deref()
        .filter(|id| !id.is_empty() && *id != task.id)
}

/// Fetch the parent of `task`, or `None` at the top of the tree.
///
/// A parent that no longer exists ends the walk like a missing link.
async fn parent_of(store: &dyn TaskStore, task: &Task) -> WaitNodeResult<Option<Task>> {
    let Some(parent_id) = direct_parent(task) else {
        return Ok(None);
    };
    match store.get_task(&TaskRef::Canonical(parent_id.to_string())).await {
        Ok(parent) => Ok(Some(parent)),
        Err(ClickUpError::NotFound(_)) => {
            warn!(task_id = %task.id, parent_id, "Parent task not found");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Top-most process-library task in the unbroken chain starting at `start`.
///
/// `start` itself counts when it is a process-library task. The walk stops at
/// the first ancestor of another type, so a process library nested under a
/// business task never reaches the business task.
pub async fn find_process_root(
    store: &dyn TaskStore,
    start: &Task,
    library_type: u64,
    max_depth: u32,
) -> WaitNodeResult<Option<Task>> {
    let mut root = (start.custom_item_id == Some(library_type)).then(|| start.clone());
    let mut visited = HashSet::from([start.id.clone()]);
    let mut current = start.clone();

    for _ in 0..max_depth {
        let Some(parent) = parent_of(store, &current).await? else {
            break;
        };
        if !visited.insert(parent.id.clone()) {
            warn!(task_id = %parent.id, "Task hierarchy loops back on itself");
            break;
        }
        if parent.custom_item_id != Some(library_type) {
            debug!(task_id = %parent.id, "Reached task outside the process library");
            break;
        }
        root = Some(parent.clone());
        current = parent;
    }

    debug!(
        start = %start.id,
        root = root.as_ref().map(|t| t.id.as_str()),
        "Process library root resolved"
    );
    Ok(root)
}

/// The top-most ancestor of `start` (or `start` itself for a root task).
pub async fn find_main_parent(
    store: &dyn TaskStore,
    start: &Task,
    max_depth: u32,
) -> WaitNodeResult<Task> {
    let mut visited = HashSet::from([start.id.clone()]);
    let mut current = start.clone();

    for _ in 0..max_depth {
        let Some(parent) = parent_of(store, &current).await? else {
            break;
        };
        if !visited.insert(parent.id.clone()) {
            warn!(task_id = %parent.id, "Task hierarchy loops back on itself");
            break;
        }
        current = parent;
    }

    debug!(start = %start.id, main = %current.id, "Main parent resolved");
    Ok(current)
}
