//! AI summary endpoint.

use ai::SummaryRequest;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::Session;
use crate::error::ApiError;
use crate::rate_limit::RouteClass;
use crate::server::AppState;

/// Summarize an escalation for the supervisor.
///
/// Always answers 200 for authenticated callers within their budget: when
/// the model is unavailable, or the body cannot be read, the summary comes
/// from the template and `fallback` is set.
pub async fn generate_escalation_summary(
    session: Session,
    State(state): State<AppState>,
    body: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    state.limiter.check(&session.email, RouteClass::Ai).await?;

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Unreadable summary request, using defaults");
            SummaryRequest::default()
        }
    };

    let summary = state.summaries.generate(&request).await;
    info!(
        task_id = request.task_id(),
        model = %summary.model_used,
        fallback = summary.fallback,
        "Escalation summary served"
    );

    Ok(Json(json!({
        "success": true,
        "summary": summary.summary,
        "model_used": summary.model_used,
        "fallback": summary.fallback,
    })))
}
