//! End-to-end tests for the task helper API.
//!
//! The router is served on a random local port over an in-memory task store
//! and driven with a real HTTP client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ai::{AIProvider, OpenAIChatProvider, OpenAISettings, SummaryGenerator, FALLBACK_LABEL};
use clickup::{MemoryTaskStore, Task, TaskStore};
use escalation::{EscalationFields, EscalationService, FieldKey};
use reqwest::StatusCode;
use serde_json::{json, Value};
use task_helper::{build_router, AppState, RateLimiter, RateLimits, SessionSigner};
use tokio::net::TcpListener;
use wait_node::{WaitField, WaitNodeFields, WaitNodeService, PROCESS_LIBRARY_TYPE};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "integration-secret";
const COOKIE_NAME: &str = "taskpages_session";
const USER: &str = "tech@example.com";

// =============================================================================
// Test Server
// =============================================================================

struct TestApp {
    addr: SocketAddr,
    store: Arc<MemoryTaskStore>,
    fields: EscalationFields,
    wait_fields: WaitNodeFields,
    client: reqwest::Client,
    cookie: String,
}

impl TestApp {
    async fn start() -> Self {
        Self::start_with(RateLimits::default(), SummaryGenerator::disabled()).await
    }

    async fn start_with(limits: RateLimits, summaries: SummaryGenerator) -> Self {
        let store = Arc::new(MemoryTaskStore::new());
        let fields = EscalationFields::default();
        let service =
            EscalationService::new(Arc::clone(&store) as Arc<dyn TaskStore>, fields.clone());
        let wait_fields = WaitNodeFields::default();
        let wait_nodes =
            WaitNodeService::new(Arc::clone(&store) as Arc<dyn TaskStore>, wait_fields.clone())
                .with_verify_delay(Duration::ZERO);
        let signer = SessionSigner::new(SECRET, COOKIE_NAME).unwrap();
        let expires_at = chrono::Utc::now().timestamp() + 3600;
        let cookie = format!("{COOKIE_NAME}={}", signer.issue(USER, expires_at));

        let state = AppState {
            service: Arc::new(service),
            wait_nodes: Arc::new(wait_nodes),
            summaries: Arc::new(summaries),
            signer: Arc::new(signer),
            limiter: Arc::new(RateLimiter::new(limits)),
            cors_allowed_origins: vec!["https://tasks.example.com".to_string()],
        };
        let app = build_router(state);

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            store,
            fields,
            wait_fields,
            client: reqwest::Client::new(),
            cookie,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn seed(&self, id: &str, parent: Option<&str>, values: &[(FieldKey, Value)]) {
        let custom_fields: Vec<_> = values
            .iter()
            .map(|(k, v)| json!({"id": self.fields.id(*k), "value": v}))
            .collect();
        let task: Task = serde_json::from_value(json!({
            "id": id,
            "custom_id": format!("TICKET-{id}"),
            "name": format!("Task {id}"),
            "parent": parent,
            "custom_fields": custom_fields,
        }))
        .unwrap();
        self.store.insert(task);
    }

    fn seed_linked(&self, id: &str) {
        self.seed(id, None, &[(FieldKey::PropertyLink, json!([{"id": "PROP_A"}]))]);
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .header("cookie", &self.cookie)
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .header("cookie", &self.cookie)
            .json(&body)
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .put(self.url(path))
            .header("cookie", &self.cookie)
            .json(&body)
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    /// business -> proc (process library) -> two steps; `wait` sits under step 2.
    fn seed_process(&self) {
        let step = self.wait_fields.id(WaitField::StepNumber);
        for (id, parent, item_type, fields) in [
            ("business", None, None, json!([])),
            ("proc", Some("business"), Some(PROCESS_LIBRARY_TYPE), json!([])),
            (
                "step2",
                Some("proc"),
                Some(PROCESS_LIBRARY_TYPE),
                json!([{"id": step, "value": "2"}]),
            ),
            (
                "step1",
                Some("proc"),
                Some(PROCESS_LIBRARY_TYPE),
                json!([{"id": step, "value": "1.5"}]),
            ),
            ("wait", Some("step2"), Some(1001), json!([])),
        ] {
            let task: Task = serde_json::from_value(json!({
                "id": id,
                "custom_id": format!("WAIT-{id}"),
                "name": format!("Task {id}"),
                "parent": parent,
                "custom_item_id": item_type,
                "custom_fields": fields,
            }))
            .unwrap();
            self.store.insert(task);
        }
    }

    async fn state_of(&self, task_id: &str) -> String {
        let (status, body) = self.get(&format!("/api/task-helper/escalation/{task_id}")).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["escalation"]["state"].as_str().unwrap().to_string()
    }
}

// =============================================================================
// Health and sessions
// =============================================================================

#[tokio::test]
async fn test_health_needs_no_session() {
    let app = TestApp::start().await;
    let body: Value = reqwest::get(app.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "healthy", "service": "task-helper"}));
}

#[tokio::test]
async fn test_auth_check_reports_session() {
    let app = TestApp::start().await;

    let (status, body) = app.get("/api/auth/check").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["email"], USER);

    let anonymous: Value = reqwest::get(app.url("/api/auth/check"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(anonymous, json!({"authenticated": false}));
}

#[tokio::test]
async fn test_api_requires_session() {
    let app = TestApp::start().await;
    app.seed_linked("t1");

    let response = app
        .client
        .post(app.url("/api/task-helper/escalate/t1"))
        .json(&json!({"reason": "Leak in unit 4"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "UNAUTHENTICATED");
    assert!(app.store.writes().is_empty());
}

#[tokio::test]
async fn test_forged_cookie_rejected() {
    let app = TestApp::start().await;
    let forger = SessionSigner::new("wrong-secret", COOKIE_NAME).unwrap();
    let cookie = format!(
        "{COOKIE_NAME}={}",
        forger.issue(USER, chrono::Utc::now().timestamp() + 3600)
    );

    let response = app
        .client
        .get(app.url("/api/task-helper/escalation/t1"))
        .header("cookie", cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Property links
// =============================================================================

#[tokio::test]
async fn test_escalation_copies_link_from_parent() {
    let app = TestApp::start().await;
    app.seed_linked("parent1");
    app.seed("child1", Some("parent1"), &[]);

    let (status, body) = app
        .get("/api/task-helper/validate-property-link/child1")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["property_link_ids"], json!(["PROP_A"]));
    assert_eq!(body["success"], true);
    assert_eq!(body["action"], "copied");
    assert_eq!(body["source_task_id"], "parent1");

    let (_, again) = app
        .get("/api/task-helper/validate-property-link/child1")
        .await;
    assert_eq!(again["action"], "existing");
    assert_eq!(again["property_link_ids"], json!(["PROP_A"]));

    let (status, body) = app
        .post(
            "/api/task-helper/escalate/child1",
            json!({"reason": "Leak in unit 4", "context": {"ai_summary": "Water leak"}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["escalation_data"]["to"], "escalated_level_1");
    assert_eq!(body["escalation_data"]["property_link"]["action"], "existing");
    assert_eq!(body["escalation_data"]["suggestion"]["status"], "disabled");
    assert!(body["ai_suggestion"].is_null());

    let (_, record) = app.get("/api/task-helper/escalation/child1").await;
    assert_eq!(record["escalation"]["reason"], "Leak in unit 4");
    assert_eq!(record["escalation"]["ai_summary"], "Water leak");
    assert_eq!(record["escalation"]["property_link"], json!(["PROP_A"]));
}

#[tokio::test]
async fn test_missing_link_rejects_without_writes() {
    let app = TestApp::start().await;
    app.seed("orphan", None, &[]);

    let (status, body) = app
        .post("/api/task-helper/escalate/orphan", json!({"reason": "Leak"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "NO_PROPERTY_LINK");
    assert!(body["message"].as_str().unwrap().contains("property link"));
    assert!(app.store.writes().is_empty());
}

// =============================================================================
// Workflow
// =============================================================================

#[tokio::test]
async fn test_full_rfi_and_level_2_flow() {
    let app = TestApp::start().await;
    app.seed_linked("t1");

    let (status, _) = app
        .post("/api/task-helper/escalate/t1", json!({"reason": "Leak"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.state_of("t1").await, "escalated_level_1");

    let (status, _) = app
        .post("/api/task-helper/request-info/t1", json!({"question": "Which unit?"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.state_of("t1").await, "escalated_level_1_awaiting_info");

    let (status, _) = app
        .post("/api/task-helper/respond-to-rfi/t1", json!({"rfi_response": "Unit 4"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.state_of("t1").await, "escalated_level_1");

    let (status, body) = app
        .post(
            "/api/task-helper/escalate-to-level-2/t1",
            json!({"context": "Needs a plumber"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["escalation_data"]["to"], "escalated_level_2");

    let (status, _) = app
        .post(
            "/api/task-helper/supervisor-response/t1",
            json!({"response": "Plumber booked"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, record) = app.get("/api/task-helper/escalation/t1").await;
    assert_eq!(record["escalation"]["state"], "resolved");
    assert_eq!(record["escalation"]["response"], "Plumber booked");
    assert_eq!(record["allowed_actions"], json!([]));
}

#[tokio::test]
async fn test_alias_path_resolves_to_canonical_task() {
    let app = TestApp::start().await;
    app.seed_linked("t1");

    let (status, body) = app.get("/api/task-helper/escalation/TICKET-t1").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["escalation"]["task_id"], "t1");
    assert_eq!(body["escalation"]["state"], "not_escalated");
    assert_eq!(body["allowed_actions"], json!(["submit"]));
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() {
    let app = TestApp::start().await;
    app.seed_linked("t1");

    let (status, body) = app
        .post("/api/task-helper/supervisor-response/t1", json!({"response": "Done"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "INVALID_TRANSITION");
    assert!(app.store.writes().is_empty());
}

#[tokio::test]
async fn test_blank_reason_is_validation_error() {
    let app = TestApp::start().await;
    app.seed_linked("t1");

    let (status, body) = app
        .post("/api/task-helper/escalate/t1", json!({"reason": "   "}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_REASON");
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let app = TestApp::start().await;
    app.seed_linked("t1");

    let response = app
        .client
        .post(app.url("/api/task-helper/escalate/t1"))
        .header("cookie", &app.cookie)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "INVALID_BODY");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = TestApp::start().await;
    app.seed_linked("t1");

    let reason = "x".repeat(task_helper::server::MAX_BODY_BYTES + 1);
    let (status, body) = app
        .post("/api/task-helper/escalate/t1", json!({ "reason": reason }))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "BODY_TOO_LARGE");
    assert!(app.store.writes().is_empty());
}

#[tokio::test]
async fn test_task_id_with_path_characters_is_rejected() {
    let app = TestApp::start().await;
    app.seed_linked("t1");

    let (status, body) = app
        .get("/api/task-helper/escalation/abc%2F..%2F..%2Fteam%2F9011954126")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_TASK_ID");

    let (status, body) = app
        .post("/api/task-helper/escalate/t1%3Fteam_id=1", json!({"reason": "Leak"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_TASK_ID");

    let (status, body) = app
        .put("/api/task/t1%2Ffield%2Fx/field/f1", json!({"value": 1}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_TASK_ID");
    assert!(app.store.writes().is_empty());
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let app = TestApp::start().await;
    let (status, body) = app.get("/api/task-helper/escalation/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "TASK_NOT_FOUND");
}

#[tokio::test]
async fn test_clickup_outage_is_service_unavailable() {
    let app = TestApp::start().await;
    app.seed_linked("t1");
    app.store.set_offline(true);

    let (status, body) = app
        .post("/api/task-helper/escalate/t1", json!({"reason": "Leak"}))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "UPSTREAM_UNAVAILABLE");
    assert!(body["technical_error"].is_string());
}

#[tokio::test]
async fn test_write_budget_returns_retry_after() {
    let limits = RateLimits {
        write_per_minute: 1,
        ..RateLimits::default()
    };
    let app = TestApp::start_with(limits, SummaryGenerator::disabled()).await;
    app.seed_linked("t1");

    let (status, _) = app
        .post("/api/task-helper/escalate/t1", json!({"reason": "Leak"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .client
        .post(app.url("/api/task-helper/supervisor-response/t1"))
        .header("cookie", &app.cookie)
        .json(&json!({"response": "Done"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "RATE_LIMITED");

    // Reads have their own budget
    let (status, _) = app.get("/api/task-helper/escalation/t1").await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Wait-node approvals
// =============================================================================

#[tokio::test]
async fn test_wait_node_initialize() {
    let app = TestApp::start().await;
    app.seed_process();

    let (status, body) = app.get("/api/wait-node/initialize/WAIT-wait").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["wait_task"]["id"], "wait");
    assert_eq!(body["root_task"]["id"], "proc");
    assert_eq!(body["main_task"]["id"], "business");
    let steps: Vec<_> = body["subtasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(steps, ["step1", "step2"]);
}

#[tokio::test]
async fn test_wait_node_without_process_library_is_not_found() {
    let app = TestApp::start().await;
    app.seed_linked("t1");

    let (status, body) = app.get("/api/wait-node/initialize/t1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NO_PROCESS_ROOT");

    let (status, _) = app.get("/api/task/t1/process-root").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wait_node_approve_returns_verified_task() {
    let app = TestApp::start().await;
    app.seed_process();
    let action = app.wait_fields.id(WaitField::HumanApprovedAction);
    let executed = app.wait_fields.id(WaitField::Executed);

    let (status, body) = app
        .post(
            "/api/wait-node/approve/wait",
            json!({ action: "send_email", executed: true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["updates"].as_array().unwrap().len(), 2);
    let fields = body["task"]["custom_fields"].as_array().unwrap();
    assert!(fields
        .iter()
        .any(|f| f["id"] == action && f["value"] == "send_email"));
    assert_eq!(app.store.writes_for("wait").len(), 2);
}

#[tokio::test]
async fn test_wait_node_approve_reports_field_errors() {
    let app = TestApp::start().await;
    app.seed_process();
    let action = app.wait_fields.id(WaitField::HumanApprovedAction);
    let executed = app.wait_fields.id(WaitField::Executed);
    app.store.fail_field(executed);

    let (status, body) = app
        .post(
            "/api/wait-node/approve/wait",
            json!({ action: "send_email", executed: true }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "PARTIAL_APPROVAL");
    assert_eq!(body["errors"][0]["field_id"], executed);
    assert_eq!(body["partial_updates"], json!([action]));
}

#[tokio::test]
async fn test_wait_node_approve_validates_body() {
    let app = TestApp::start().await;
    app.seed_process();

    let (status, body) = app.post("/api/wait-node/approve/wait", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "NO_APPROVAL_DATA");

    let status_field = app.fields.id(FieldKey::Status);
    let (status, body) = app
        .post("/api/wait-node/approve/wait", json!({ status_field: 2 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "UNKNOWN_FIELD");
    assert!(app.store.writes().is_empty());
}

#[tokio::test]
async fn test_task_lookups() {
    let app = TestApp::start().await;
    app.seed_process();

    let (status, body) = app.get("/api/task/proc?include_subtasks=true").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["custom_item_id"], PROCESS_LIBRARY_TYPE);
    assert_eq!(body["subtasks"].as_array().unwrap().len(), 2);

    let (status, body) = app.get("/api/task/proc").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("subtasks").is_none());

    let (status, body) = app.get("/api/task/step1/process-root").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "proc");

    let (status, body) = app.get("/api/task/proc/subtasks-detailed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subtasks"][0]["id"], "step1");
}

#[tokio::test]
async fn test_field_update_requires_value() {
    let app = TestApp::start().await;
    app.seed_process();
    let field = app.wait_fields.id(WaitField::WaitStatus);

    let (status, body) = app
        .put(&format!("/api/task/wait/field/{field}"), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALUE_REQUIRED");

    let (status, body) = app
        .put(&format!("/api/task/WAIT-wait/field/{field}"), json!({"value": 1}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["task_id"], "wait");
    assert_eq!(app.store.task("wait").unwrap().ordinal_field(field), Some(1));
}

// =============================================================================
// AI summaries
// =============================================================================

#[tokio::test]
async fn test_summary_with_null_task_uses_template() {
    let app = TestApp::start().await;

    let (status, body) = app
        .post(
            "/api/ai/generate-escalation-summary",
            json!({
                "task_id": "t1",
                "reason": "Leak",
                "context": {"task": null, "parent_task": null}
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["model_used"], "fallback-template");
    let summary = body["summary"].as_str().unwrap();
    assert!(summary.starts_with(FALLBACK_LABEL));
    assert!(summary.contains("Reason: Leak"));
}

#[tokio::test]
async fn test_summary_from_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4",
            "choices": [{"message": {"role": "assistant", "content": "Water leak in unit 4."}}],
            "usage": {"prompt_tokens": 50, "completion_tokens": 6, "total_tokens": 56}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAIChatProvider::new(OpenAISettings {
        api_key: Some("sk-test".to_string()),
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();
    let summaries = SummaryGenerator::new(
        vec![Arc::new(provider) as Arc<dyn AIProvider>],
        vec!["gpt-4".to_string()],
        Duration::from_secs(5),
    );
    let app = TestApp::start_with(RateLimits::default(), summaries).await;

    let (status, body) = app
        .post(
            "/api/ai/generate-escalation-summary",
            json!({"task_id": "t1", "reason": "Leak", "context": {"task": {"name": "Unit 4"}}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["summary"], "Water leak in unit 4.");
    assert_eq!(body["model_used"], "gpt-4");
    assert_eq!(body["fallback"], false);
}

#[tokio::test]
async fn test_summary_with_unreadable_body_still_answers() {
    let app = TestApp::start().await;

    let response = app
        .client
        .post(app.url("/api/ai/generate-escalation-summary"))
        .header("cookie", &app.cookie)
        .header("content-type", "application/json")
        .body("[1, 2")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fallback"], true);
}
