//! HTTP server for the task helper pages.

use std::sync::Arc;

use ai::SummaryGenerator;
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use escalation::EscalationService;
use wait_node::WaitNodeService;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::SessionSigner;
use crate::handlers::{
    ai as ai_handlers, escalation as escalation_handlers, health, wait_node as wait_node_handlers,
};
use crate::rate_limit::RateLimiter;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "task-helper";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Escalation workflow over ClickUp.
    pub service: Arc<EscalationService>,
    /// Wait-node page data and approvals.
    pub wait_nodes: Arc<WaitNodeService>,
    /// Summary generation with template fallback.
    pub summaries: Arc<SummaryGenerator>,
    /// Session cookie verification.
    pub signer: Arc<SessionSigner>,
    /// Per-user request budgets.
    pub limiter: Arc<RateLimiter>,
    /// Origins allowed to send credentialed requests.
    pub cors_allowed_origins: Vec<String>,
}

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_allowed_origins);

    Router::new()
        // Health and session
        .route("/health", get(health::health_check))
        .route("/api/auth/check", get(health::auth_check))
        // Escalation workflow
        .route(
            "/api/task-helper/escalation/{task_id}",
            get(escalation_handlers::get_escalation),
        )
        .route(
            "/api/task-helper/validate-property-link/{task_id}",
            get(escalation_handlers::validate_property_link),
        )
        .route(
            "/api/task-helper/escalate/{task_id}",
            post(escalation_handlers::escalate),
        )
        .route(
            "/api/task-helper/supervisor-response/{task_id}",
            post(escalation_handlers::supervisor_response),
        )
        .route(
            "/api/task-helper/request-info/{task_id}",
            post(escalation_handlers::request_info),
        )
        .route(
            "/api/task-helper/respond-to-rfi/{task_id}",
            post(escalation_handlers::respond_to_rfi),
        )
        .route(
            "/api/task-helper/escalate-to-level-2/{task_id}",
            post(escalation_handlers::escalate_to_level_2),
        )
        // Wait-node approvals
        .route(
            "/api/wait-node/initialize/{task_id}",
            get(wait_node_handlers::initialize),
        )
        .route(
            "/api/wait-node/approve/{task_id}",
            post(wait_node_handlers::approve),
        )
        // Task lookups shared by the pages
        .route("/api/task/{task_id}", get(wait_node_handlers::get_task))
        .route(
            "/api/task/{task_id}/process-root",
            get(wait_node_handlers::process_root),
        )
        .route(
            "/api/task/{task_id}/subtasks-detailed",
            get(wait_node_handlers::subtasks_detailed),
        )
        .route(
            "/api/task/{task_id}/field/{field_id}",
            put(wait_node_handlers::update_field),
        )
        // AI
        .route(
            "/api/ai/generate-escalation-summary",
            post(ai_handlers::generate_escalation_summary),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

/// Credentialed CORS for the configured origins.
///
/// A wildcard cannot be combined with credentials, so `*` entries are
/// dropped along with values that are not valid header values.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            if origin.trim() == "*" {
                warn!("Ignoring wildcard CORS origin, list the page origins explicitly");
                return None;
            }
            match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}
