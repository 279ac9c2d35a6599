//! Health and session checks.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use serde_json::{json, Value};

use crate::server::{AppState, SERVICE_NAME};

/// Liveness check.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}

/// Report whether the caller has a valid session. Never rejects.
pub async fn auth_check(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    match state
        .signer
        .verify_headers(&headers, chrono::Utc::now().timestamp())
    {
        Ok(session) => Json(json!({
            "authenticated": true,
            "user": { "email": session.email },
        })),
        Err(_) => Json(json!({ "authenticated": false })),
    }
}
