//! Escalation workflow endpoints.
//!
//! Every route takes the task id from the path (canonical id or custom alias
//! such as `TICKET-65711`) and requires a session.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use escalation::{EscalationError, ResolvedLink, SubmitInput};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::auth::Session;
use crate::error::ApiError;
use crate::handlers::task_ref;
use crate::rate_limit::RouteClass;
use crate::server::AppState;

// =============================================================================
// Request bodies
// =============================================================================

/// Body of `POST /escalate/{task_id}`.
#[derive(Debug, Default, Deserialize)]
pub struct EscalateBody {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub context: Option<EscalateContext>,
}

/// Extra data the page collected before submitting.
#[derive(Debug, Default, Deserialize)]
pub struct EscalateContext {
    /// Summary produced by `/api/ai/generate-escalation-summary`.
    #[serde(default)]
    pub ai_summary: Option<String>,
}

/// Body of `POST /supervisor-response/{task_id}`.
#[derive(Debug, Deserialize)]
pub struct SupervisorResponseBody {
    #[serde(default)]
    pub response: Option<String>,
}

/// Body of `POST /request-info/{task_id}`.
#[derive(Debug, Deserialize)]
pub struct RequestInfoBody {
    #[serde(default)]
    pub question: Option<String>,
}

/// Body of `POST /respond-to-rfi/{task_id}`.
#[derive(Debug, Deserialize)]
pub struct RfiResponseBody {
    #[serde(default)]
    pub rfi_response: Option<String>,
}

/// Body of `POST /escalate-to-level-2/{task_id}`.
#[derive(Debug, Default, Deserialize)]
pub struct EscalateToLevel2Body {
    /// Optional note for the level 2 reviewer.
    #[serde(default)]
    pub context: Option<String>,
}

/// Response of `GET /validate-property-link/{task_id}`.
#[derive(Debug, Serialize)]
pub struct PropertyLinkResponse {
    pub success: bool,
    #[serde(flatten)]
    pub link: ResolvedLink,
}

// =============================================================================
// Handlers
// =============================================================================

/// Current escalation record with the actions allowed from its state.
pub async fn get_escalation(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Read).await?;
    let task = task_ref(&task_id)?;

    let record = state
        .service
        .load(&task)
        .await
        .map_err(|e| failed(&task_id, "load", e))?;
    let allowed_actions = record.allowed_actions();

    Ok(Json(json!({
        "success": true,
        "escalation": record,
        "allowed_actions": allowed_actions,
    })))
}

/// Make sure the task carries a property link, copying it from a parent.
pub async fn validate_property_link(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<PropertyLinkResponse>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Read).await?;
    let task = task_ref(&task_id)?;

    let link = state
        .service
        .validate_property_link(&task)
        .await
        .map_err(|e| failed(&task_id, "validate_property_link", e))?;

    Ok(Json(PropertyLinkResponse {
        success: true,
        link,
    }))
}

/// Submit a new level 1 escalation.
pub async fn escalate(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    body: Result<Json<EscalateBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Write).await?;
    let task = task_ref(&task_id)?;
    let Json(body) = body?;

    let input = SubmitInput {
        reason: body.reason.unwrap_or_default(),
        ai_summary: body.context.and_then(|c| c.ai_summary),
    };
    let outcome = state
        .service
        .submit(&task, &input, Some(&session.email))
        .await
        .map_err(|e| failed(&task_id, "escalate", e))?;

    info!(
        task_id = %outcome.transition.task_id,
        user = %session.email,
        to = %outcome.transition.to,
        "Escalation submitted"
    );
    let ai_suggestion = outcome.suggestion.text().map(String::from);

    Ok(Json(json!({
        "success": true,
        "escalation_data": outcome,
        "ai_suggestion": ai_suggestion,
    })))
}

/// Supervisor answers and resolves the escalation.
pub async fn supervisor_response(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    body: Result<Json<SupervisorResponseBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Write).await?;
    let task = task_ref(&task_id)?;
    let Json(body) = body?;

    let outcome = state
        .service
        .answer(
            &task,
            body.response.as_deref().unwrap_or_default(),
            Some(&session.email),
        )
        .await
        .map_err(|e| failed(&task_id, "supervisor_response", e))?;

    info!(
        task_id = %outcome.task_id,
        user = %session.email,
        "Escalation resolved"
    );
    Ok(Json(json!({ "success": true, "escalation_data": outcome })))
}

/// Supervisor asks the employee for more information.
pub async fn request_info(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    body: Result<Json<RequestInfoBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Write).await?;
    let task = task_ref(&task_id)?;
    let Json(body) = body?;

    let outcome = state
        .service
        .request_info(
            &task,
            body.question.as_deref().unwrap_or_default(),
            Some(&session.email),
        )
        .await
        .map_err(|e| failed(&task_id, "request_info", e))?;

    info!(
        task_id = %outcome.task_id,
        user = %session.email,
        to = %outcome.to,
        "Information requested"
    );
    Ok(Json(json!({ "success": true, "escalation_data": outcome })))
}

/// Employee answers an information request.
pub async fn respond_to_rfi(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    body: Result<Json<RfiResponseBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Write).await?;
    let task = task_ref(&task_id)?;
    let Json(body) = body?;

    let outcome = state
        .service
        .respond_to_rfi(
            &task,
            body.rfi_response.as_deref().unwrap_or_default(),
            Some(&session.email),
        )
        .await
        .map_err(|e| failed(&task_id, "respond_to_rfi", e))?;

    info!(
        task_id = %outcome.task_id,
        user = %session.email,
        to = %outcome.to,
        "Information request answered"
    );
    Ok(Json(json!({ "success": true, "escalation_data": outcome })))
}

/// Hand a level 1 escalation to level 2.
pub async fn escalate_to_level_2(
    session: Session,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    body: Result<Json<EscalateToLevel2Body>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Write).await?;
    let task = task_ref(&task_id)?;
    let Json(body) = body?;

    let outcome = state
        .service
        .escalate_to_level_2(
            &task,
            body.context.as_deref(),
            Some(&session.email),
        )
        .await
        .map_err(|e| failed(&task_id, "escalate_to_level_2", e))?;

    info!(
        task_id = %outcome.task_id,
        user = %session.email,
        "Escalated to level 2"
    );
    Ok(Json(json!({ "success": true, "escalation_data": outcome })))
}

/// Log a failed operation with its task and convert it for the response.
fn failed(task_id: &str, operation: &'static str, e: EscalationError) -> ApiError {
    let error = ApiError::from(e);
    if error.status().is_server_error() {
        error!(
            task_id,
            operation,
            code = error.code(),
            error = %error,
            "Escalation operation failed"
        );
    } else {
        warn!(
            task_id,
            operation,
            code = error.code(),
            error = %error,
            "Escalation request rejected"
        );
    }
    error
}
