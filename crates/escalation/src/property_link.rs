//! Property-link resolution.
//!
//! A task must be linked to its property before it can be escalated. Tasks
//! created as subtasks often lack the link while their parent has it; in
//! that case the link is copied down instead of rejecting the escalation.

use std::collections::HashSet;

use clickup::{ClickUpError, FieldWrite, Task, TaskRef, TaskStore};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{EscalationError, EscalationResult};
use crate::fields::{EscalationFields, FieldKey};

/// Ancestors searched when the task itself has no link.
pub const DEFAULT_MAX_DEPTH: u32 = 1;

/// Where the link came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LinkOrigin {
    /// Already present on the task; nothing was written.
    Existing,
    /// Copied from an ancestor.
    Copied { source_task_id: String },
}

/// A resolved property link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLink {
    /// Canonical id of the task the link is now on.
    pub task_id: String,
    pub property_link_ids: Vec<String>,
    #[serde(flatten)]
    pub origin: LinkOrigin,
}

/// Make sure `task` carries a property link.
///
/// Walks up to `max_depth` ancestors (direct parent first, falling back to
/// the top-level parent) and copies the first non-empty link onto the task
/// with an additive write. Calling this again on the same task is a no-op.
pub async fn resolve(
    store: &dyn TaskStore,
    fields: &EscalationFields,
    task: &Task,
    max_depth: u32,
) -> EscalationResult<ResolvedLink> {
    let link_field = fields.id(FieldKey::PropertyLink);

    let existing = task.relation_ids(link_field);
    if !existing.is_empty() {
        return Ok(ResolvedLink {
            task_id: task.id.clone(),
            property_link_ids: existing,
            origin: LinkOrigin::Existing,
        });
    }

    let mut visited = HashSet::from([task.id.clone()]);
    let mut next = task.parent_id().map(String::from);
    let mut depth = 0;

    while let Some(ancestor_id) = next.take() {
        if depth >= max_depth || !visited.insert(ancestor_id.clone()) {
            break;
        }
        depth += 1;

        let ancestor = match store.get_task(&TaskRef::Canonical(ancestor_id.clone())).await {
            Ok(ancestor) => ancestor,
            Err(ClickUpError::NotFound(_)) => {
                warn!(task_id = %task.id, ancestor_id = %ancestor_id, "Ancestor task not found");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let ids = ancestor.relation_ids(link_field);
        if !ids.is_empty() {
            store
                .set_field(&task.id, link_field, &FieldWrite::AddRelations(ids.clone()))
                .await?;
            info!(
                task_id = %task.id,
                source_task_id = %ancestor.id,
                depth,
                "Copied property link from ancestor"
            );
            return Ok(ResolvedLink {
                task_id: task.id.clone(),
                property_link_ids: ids,
                origin: LinkOrigin::Copied {
                    source_task_id: ancestor.id,
                },
            });
        }

        next = ancestor.parent_id().map(String::from);
    }

    Err(EscalationError::NoPropertyLink {
        task_id: task.id.clone(),
    })
}
