//! Wait-node page endpoints and the task lookups it shares.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use clickup::Task;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};
use wait_node::{WaitNodeError, WaitNodeView};

use crate::auth::Session;
use crate::error::ApiError;
use crate::handlers::task_ref;
use crate::rate_limit::RouteClass;
use crate::server::AppState;

/// Query of `GET /api/task/{task_id}`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    #[serde(default)]
    pub include_subtasks: bool,
}

/// Root, wait task, business task and ordered steps for the page.
pub async fn initialize(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<WaitNodeView>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Read).await?;
    let task = task_ref(&task_id)?;

    let view = state
        .wait_nodes
        .initialize(&task)
        .await
        .map_err(|e| failed(&task_id, "initialize", e))?;
    Ok(Json(view))
}

/// Apply the approval the reviewer submitted.
///
/// The body maps wait-node field UUIDs to the values to store.
pub async fn approve(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Write).await?;
    let task = task_ref(&task_id)?;
    let Json(approvals) = body?;

    let outcome = state
        .wait_nodes
        .approve(&task, &approvals)
        .await
        .map_err(|e| failed(&task_id, "approve", e))?;

    info!(
        task_id = %outcome.task.id,
        user = %session.email,
        fields = outcome.updates.len(),
        "Wait node approved"
    );
    Ok(Json(json!({
        "success": true,
        "task": outcome.task,
        "updates": outcome.updates,
    })))
}

/// A task by canonical id or alias, optionally with its subtask list.
pub async fn get_task(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Task>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Read).await?;
    let task = task_ref(&task_id)?;

    let task = state
        .wait_nodes
        .task(&task, query.include_subtasks)
        .await
        .map_err(|e| failed(&task_id, "get_task", e))?;
    Ok(Json(task))
}

/// Process-library root above a task.
pub async fn process_root(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Read).await?;
    let task = task_ref(&task_id)?;

    let root = state
        .wait_nodes
        .process_root(&task)
        .await
        .map_err(|e| failed(&task_id, "process_root", e))?;
    Ok(Json(root))
}

/// Subtasks with custom fields, in step-number order.
pub async fn subtasks_detailed(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Read).await?;
    let task = task_ref(&task_id)?;

    let subtasks = state
        .wait_nodes
        .subtasks(&task)
        .await
        .map_err(|e| failed(&task_id, "subtasks_detailed", e))?;
    Ok(Json(json!({ "subtasks": subtasks })))
}

/// Write a single wait-node field. The body must carry a `value` key.
pub async fn update_field(
    session: Session,
    State(state): State<AppState>,
    Path((task_id, field_id)): Path<(String, String)>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Write).await?;
    let task = task_ref(&task_id)?;
    let Json(mut body) = body?;

    let canonical = state
        .wait_nodes
        .update_field(&task, &field_id, body.remove("value"))
        .await
        .map_err(|e| failed(&task_id, "update_field", e))?;

    info!(
        task_id = %canonical,
        field_id = %field_id,
        user = %session.email,
        "Task field updated"
    );
    Ok(Json(json!({
        "success": true,
        "task_id": canonical,
        "field_id": field_id,
    })))
}

/// Log a failed operation with its task and convert it for the response.
fn failed(task_id: &str, operation: &'static str, e: WaitNodeError) -> ApiError {
    let error = ApiError::from(e);
    if error.status().is_server_error() {
        error!(
            task_id,
            operation,
            code = error.code(),
            error = %error,
            "Wait-node operation failed"
        );
    } else {
        warn!(
            task_id,
            operation,
            code = error.code(),
            error = %error,
            "Wait-node request rejected"
        );
    }
    error
}
