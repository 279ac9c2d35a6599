//! Wait-node service behaviour against an in-memory task store.

use std::sync::Arc;
use std::time::Duration;

use clickup::{FieldWrite, MemoryTaskStore, Task, TaskRef, TaskStore};
use serde_json::{json, Map, Value};
use wait_node::{
    WaitField, WaitNodeError, WaitNodeFields, WaitNodeService, DEFAULT_VERIFY_DELAY,
    PROCESS_LIBRARY_TYPE,
};

// =========================================================================
// Fixtures
// =========================================================================

struct Harness {
    store: Arc<MemoryTaskStore>,
    fields: WaitNodeFields,
}

impl Harness {
    fn new() -> Self {
        Self {
            store: Arc::new(MemoryTaskStore::new()),
            fields: WaitNodeFields::default(),
        }
    }

    fn service(&self) -> WaitNodeService {
        WaitNodeService::new(
            Arc::clone(&self.store) as Arc<dyn TaskStore>,
            self.fields.clone(),
        )
    }

    fn seed(&self, id: &str, parent: Option<&str>, item_type: Option<u64>, step: Option<Value>) {
        let custom_fields: Vec<Value> = step
            .map(|v| json!({"id": self.fields.id(WaitField::StepNumber), "value": v}))
            .into_iter()
            .collect();
        let task: Task = serde_json::from_value(json!({
            "id": id,
            "custom_id": format!("WAIT-{id}"),
            "name": format!("Task {id}"),
            "parent": parent,
            "custom_item_id": item_type,
            "custom_fields": custom_fields,
        }))
        .unwrap();
        self.store.insert(task);
    }

    /// business -> proc (library) -> steps; the wait task is one of the steps.
    fn seed_process(&self) {
        self.seed("business", None, None, None);
        self.seed("proc", Some("business"), Some(PROCESS_LIBRARY_TYPE), None);
        self.seed("step3", Some("proc"), Some(PROCESS_LIBRARY_TYPE), Some(json!(3)));
        self.seed("step21", Some("proc"), Some(PROCESS_LIBRARY_TYPE), Some(json!("2.1")));
        self.seed("step2", Some("proc"), Some(PROCESS_LIBRARY_TYPE), Some(json!("2")));
        self.seed("intro", Some("proc"), Some(PROCESS_LIBRARY_TYPE), None);
        self.seed("wait", Some("step3"), Some(1001), None);
    }

    fn approvals(&self, values: &[(WaitField, Value)]) -> Map<String, Value> {
        values
            .iter()
            .map(|(k, v)| (self.fields.id(*k).to_string(), v.clone()))
            .collect()
    }
}

fn task_ref(raw: &str) -> TaskRef {
    TaskRef::parse(raw).unwrap()
}

// =========================================================================
// Initialize
// =========================================================================

#[tokio::test]
async fn test_initialize_collects_page_data() {
    let h = Harness::new();
    h.seed_process();

    let view = h.service().initialize(&task_ref("wait")).await.unwrap();

    assert_eq!(view.wait_task.id, "wait");
    assert_eq!(view.root_task.id, "proc");
    assert_eq!(view.main_task.id, "business");
    let steps: Vec<_> = view.subtasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(steps, ["intro", "step2", "step21", "step3"]);
    assert!(h.store.writes().is_empty());
}

#[tokio::test]
async fn test_initialize_by_alias() {
    let h = Harness::new();
    h.seed_process();

    let view = h.service().initialize(&task_ref("WAIT-wait")).await.unwrap();
    assert_eq!(view.wait_task.id, "wait");
    assert_eq!(view.root_task.id, "proc");
}

#[tokio::test]
async fn test_initialize_without_process_library() {
    let h = Harness::new();
    h.seed("business", None, None, None);
    h.seed("plain", Some("business"), None, None);

    let err = h.service().initialize(&task_ref("plain")).await.unwrap_err();
    assert!(matches!(err, WaitNodeError::NoProcessRoot { ref task_id } if task_id == "plain"));
    assert_eq!(err.code(), "NO_PROCESS_ROOT");
}

#[tokio::test]
async fn test_initialize_unknown_task() {
    let h = Harness::new();
    let err = h.service().initialize(&task_ref("nope")).await.unwrap_err();
    assert!(matches!(err, WaitNodeError::NotFound(_)));
}

#[tokio::test]
async fn test_subtasks_in_step_order() {
    let h = Harness::new();
    h.seed_process();

    let steps = h.service().subtasks(&task_ref("proc")).await.unwrap();
    let ids: Vec<_> = steps.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["intro", "step2", "step21", "step3"]);

    let none = h.service().subtasks(&task_ref("wait")).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_process_root_from_library_step() {
    let h = Harness::new();
    h.seed_process();

    let root = h.service().process_root(&task_ref("step21")).await.unwrap();
    assert_eq!(root.id, "proc");
}

// =========================================================================
// Approve
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_approve_writes_fields_and_rereads() {
    let h = Harness::new();
    h.seed_process();
    let approvals = h.approvals(&[
        (WaitField::HumanApprovedAction, json!("send_email")),
        (WaitField::HumanApprovedValue, json!("tenant@example.com")),
        (WaitField::Executed, json!(true)),
    ]);

    let started = tokio::time::Instant::now();
    let outcome = h
        .service()
        .approve(&task_ref("WAIT-wait"), &approvals)
        .await
        .unwrap();

    assert!(started.elapsed() >= DEFAULT_VERIFY_DELAY);
    let expected: Vec<&String> = approvals.keys().collect();
    assert_eq!(outcome.updates.iter().collect::<Vec<_>>(), expected);
    assert_eq!(
        outcome
            .task
            .text_field(h.fields.id(WaitField::HumanApprovedAction))
            .as_deref(),
        Some("send_email")
    );
    assert_eq!(
        outcome.task.field_value(h.fields.id(WaitField::Executed)),
        Some(&json!(true))
    );

    let writes = h.store.writes_for("wait");
    assert_eq!(writes.len(), 3);
    assert!(writes
        .iter()
        .all(|w| matches!(w.write, FieldWrite::Raw(_))));
}

#[tokio::test]
async fn test_approve_reports_failed_fields() {
    let h = Harness::new();
    h.seed_process();
    let failing = h.fields.id(WaitField::Executed).to_string();
    h.store.fail_field(&failing);
    let approvals = h.approvals(&[
        (WaitField::HumanApprovedAction, json!("send_email")),
        (WaitField::Executed, json!(true)),
    ]);

    let err = h
        .service()
        .with_verify_delay(Duration::ZERO)
        .approve(&task_ref("wait"), &approvals)
        .await
        .unwrap_err();

    match err {
        WaitNodeError::PartialApproval {
            task_id,
            failures,
            updated,
        } => {
            assert_eq!(task_id, "wait");
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].field_id, failing);
            assert!(failures[0].error.contains("injected failure"));
            assert_eq!(updated, [h.fields.id(WaitField::HumanApprovedAction)]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.store.writes_for("wait").len(), 1);
}

#[tokio::test]
async fn test_approve_rejects_empty_and_foreign_fields() {
    let h = Harness::new();
    h.seed_process();
    let svc = h.service();

    let err = svc.approve(&task_ref("wait"), &Map::new()).await.unwrap_err();
    assert!(matches!(err, WaitNodeError::NoApprovalData));

    let mut approvals = h.approvals(&[(WaitField::Executed, json!(true))]);
    approvals.insert("8d784bd0-18e5-4db3-b45e-9a2900262e04".to_string(), json!(2));
    let err = svc.approve(&task_ref("wait"), &approvals).await.unwrap_err();
    assert!(matches!(err, WaitNodeError::UnknownField(ref id) if id.starts_with("8d784bd0")));

    assert!(h.store.writes().is_empty());
}

#[tokio::test]
async fn test_update_field_requires_value() {
    let h = Harness::new();
    h.seed_process();
    let svc = h.service();
    let field = h.fields.id(WaitField::WaitStatus);

    let err = svc
        .update_field(&task_ref("wait"), field, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WaitNodeError::ValueRequired));

    let task_id = svc
        .update_field(&task_ref("WAIT-wait"), field, Some(json!(1)))
        .await
        .unwrap();
    assert_eq!(task_id, "wait");
    assert_eq!(
        h.store.task("wait").unwrap().ordinal_field(field),
        Some(1)
    );
}
