//! ClickUp task and custom field types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A ClickUp task as returned by `GET /task/{id}`.
///
/// The attributes the task helper reads are modelled; everything else in the
/// payload is kept in [`Task::extra`] so pages receive the task unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    /// Canonical task id.
    pub id: String,
    /// Custom alias (e.g. `TICKET-65711`), when the workspace uses them.
    #[serde(default)]
    pub custom_id: Option<String>,
    /// Task name.
    #[serde(default)]
    pub name: String,
    /// Direct parent task id.
    #[serde(default)]
    pub parent: Option<String>,
    /// Root of the subtask tree.
    #[serde(default)]
    pub top_level_parent: Option<String>,
    /// Workflow status.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Priority, absent when unset.
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    /// Custom field values.
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    /// Custom task type, `None` for plain tasks.
    #[serde(default)]
    pub custom_item_id: Option<u64>,
    /// Direct subtasks; only sent when requested with `include_subtasks`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<SubtaskRef>,
    /// Attributes not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Subtask entry of a task fetched with `include_subtasks`.
///
/// ClickUp omits custom fields here, so callers fetch each subtask.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskRef {
    /// Canonical id of the subtask.
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Workflow status of a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Status label.
    #[serde(default)]
    pub status: String,
}

/// Priority of a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPriority {
    /// Priority label (`urgent`, `high`, `normal`, `low`).
    #[serde(default)]
    pub priority: String,
}

/// A custom field attached to a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomField {
    /// Field UUID.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Field type (`text`, `drop_down`, `date`, `tasks`, ...).
    #[serde(default, rename = "type")]
    pub field_type: String,
    /// Current value; missing when the field has never been set.
    #[serde(default)]
    pub value: Option<Value>,
}

impl Task {
    /// Look up a custom field by UUID.
    #[must_use]
    pub fn field(&self, field_id: &str) -> Option<&CustomField> {
        self.custom_fields.iter().find(|f| f.id == field_id)
    }

    /// Value of a custom field, with `null`, `""` and `[]` treated as unset.
    #[must_use]
    pub fn field_value(&self, field_id: &str) -> Option<&Value> {
        self.field(field_id)
            .and_then(|f| f.value.as_ref())
            .filter(|v| !is_empty_value(v))
    }

    /// Text value of a custom field.
    #[must_use]
    pub fn text_field(&self, field_id: &str) -> Option<String> {
        match self.field_value(field_id)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::String(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Ordinal of a dropdown field.
    ///
    /// ClickUp reports dropdown values as the option's `orderindex`, sometimes
    /// as a number and sometimes as a numeric string.
    #[must_use]
    pub fn ordinal_field(&self, field_id: &str) -> Option<u32> {
        self.field_value(field_id)
            .and_then(value_as_i64)
            .and_then(|n| u32::try_from(n).ok())
    }

    /// Numeric value of a field, accepting decimal strings such as `"2.1"`.
    #[must_use]
    pub fn number_field(&self, field_id: &str) -> Option<f64> {
        match self.field_value(field_id)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Unix-millisecond timestamp stored in a date field.
    #[must_use]
    pub fn timestamp_field(&self, field_id: &str) -> Option<i64> {
        self.field_value(field_id).and_then(value_as_i64)
    }

    /// Task ids held by a relationship (`tasks`) field.
    ///
    /// Relationship values come back as a list of task objects; lists of bare
    /// ids are accepted too. An unset field yields an empty list.
    #[must_use]
    pub fn relation_ids(&self, field_id: &str) -> Vec<String> {
        let Some(Value::Array(items)) = self.field_value(field_id) else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| match item {
                Value::String(id) => Some(id.clone()),
                Value::Object(obj) => obj.get("id").and_then(Value::as_str).map(String::from),
                _ => None,
            })
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Nearest ancestor: the direct parent, else the top-level parent.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent
            .as_deref()
            .or(self.top_level_parent.as_deref())
            .filter(|id| !id.is_empty() && *id != self.id)
    }
}

/// A typed write against a custom field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldWrite {
    /// Set a text / long-text field.
    Text(String),
    /// Select a dropdown option by ordinal.
    Dropdown(u32),
    /// Set a date field (Unix ms, with time component).
    Date(i64),
    /// Add task ids to a relationship field without touching existing ones.
    AddRelations(Vec<String>),
    /// Any JSON value, posted unchanged (page-driven approvals).
    Raw(Value),
    /// Remove the field value entirely.
    Clear,
}

impl FieldWrite {
    /// Request body for `POST /task/{id}/field/{field_id}`.
    ///
    /// Returns `None` for [`FieldWrite::Clear`], which is a `DELETE` instead.
    #[must_use]
    pub fn to_body(&self) -> Option<Value> {
        match self {
            Self::Text(s) => Some(json!({ "value": s })),
            Self::Dropdown(n) => Some(json!({ "value": n })),
            Self::Date(ms) => Some(json!({ "value": ms, "value_options": { "time": true } })),
            Self::AddRelations(ids) => Some(json!({ "value": { "add": ids, "rem": [] } })),
            Self::Raw(value) => Some(json!({ "value": value })),
            Self::Clear => None,
        }
    }
}

fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with(fields: Value) -> Task {
        serde_json::from_value(json!({
            "id": "868abc",
            "name": "Leak in unit 4",
            "custom_fields": fields,
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_minimal_task() {
        let task: Task = serde_json::from_str(r#"{"id": "868abc"}"#).unwrap();
        assert_eq!(task.id, "868abc");
        assert!(task.custom_fields.is_empty());
        assert!(task.parent.is_none());
    }

    #[test]
    fn test_empty_values_are_unset() {
        let task = task_with(json!([
            {"id": "a", "type": "text", "value": ""},
            {"id": "b", "type": "tasks", "value": []},
            {"id": "c", "type": "text", "value": null},
            {"id": "d", "type": "text"},
        ]));
        for id in ["a", "b", "c", "d", "missing"] {
            assert!(task.field_value(id).is_none(), "{id} should be unset");
        }
    }

    #[test]
    fn test_ordinal_accepts_number_and_string() {
        let task = task_with(json!([
            {"id": "status", "type": "drop_down", "value": 3},
            {"id": "level", "type": "drop_down", "value": "1"},
            {"id": "bad", "type": "drop_down", "value": "abc"},
        ]));
        assert_eq!(task.ordinal_field("status"), Some(3));
        assert_eq!(task.ordinal_field("level"), Some(1));
        assert_eq!(task.ordinal_field("bad"), None);
    }

    #[test]
    fn test_timestamp_from_string() {
        let task = task_with(json!([
            {"id": "submitted", "type": "date", "value": "1733482800000"},
        ]));
        assert_eq!(task.timestamp_field("submitted"), Some(1_733_482_800_000));
    }

    #[test]
    fn test_relation_ids_from_objects_and_strings() {
        let task = task_with(json!([
            {
                "id": "link",
                "type": "tasks",
                "value": [{"id": "PROP_A", "name": "Unit 4"}, {"name": "no id"}]
            },
            {"id": "plain", "type": "tasks", "value": ["PROP_B"]},
        ]));
        assert_eq!(task.relation_ids("link"), vec!["PROP_A".to_string()]);
        assert_eq!(task.relation_ids("plain"), vec!["PROP_B".to_string()]);
        assert!(task.relation_ids("missing").is_empty());
    }

    #[test]
    fn test_parent_falls_back_to_top_level() {
        let mut task = task_with(json!([]));
        assert_eq!(task.parent_id(), None);

        task.top_level_parent = Some("root".to_string());
        assert_eq!(task.parent_id(), Some("root"));

        task.parent = Some("direct".to_string());
        assert_eq!(task.parent_id(), Some("direct"));

        // A root task reports itself as its own top-level parent
        task.parent = None;
        task.top_level_parent = Some("868abc".to_string());
        assert_eq!(task.parent_id(), None);
    }

    #[test]
    fn test_field_write_bodies() {
        assert_eq!(
            FieldWrite::Text("hi".into()).to_body(),
            Some(json!({"value": "hi"}))
        );
        assert_eq!(FieldWrite::Dropdown(4).to_body(), Some(json!({"value": 4})));
        assert_eq!(
            FieldWrite::Date(10).to_body(),
            Some(json!({"value": 10, "value_options": {"time": true}}))
        );
        assert_eq!(
            FieldWrite::AddRelations(vec!["PROP_A".into()]).to_body(),
            Some(json!({"value": {"add": ["PROP_A"], "rem": []}}))
        );
        assert_eq!(
            FieldWrite::Raw(json!({"approved": true})).to_body(),
            Some(json!({"value": {"approved": true}}))
        );
        assert_eq!(FieldWrite::Clear.to_body(), None);
    }

    #[test]
    fn test_number_field_accepts_decimal_strings() {
        let task = task_with(json!([
            {"id": "step", "type": "text", "value": "2.1"},
            {"id": "count", "type": "number", "value": 3},
            {"id": "bad", "type": "text", "value": "second"},
        ]));
        assert_eq!(task.number_field("step"), Some(2.1));
        assert_eq!(task.number_field("count"), Some(3.0));
        assert_eq!(task.number_field("bad"), None);
        assert_eq!(task.number_field("missing"), None);
    }

    #[test]
    fn test_unmodelled_attributes_survive_round_trip() {
        let task: Task = serde_json::from_value(json!({
            "id": "868abc",
            "custom_item_id": 1018,
            "description": "Wait for approval",
            "subtasks": [{"id": "868s1", "name": "Step 1"}],
        }))
        .unwrap();
        assert_eq!(task.custom_item_id, Some(1018));
        assert_eq!(task.subtasks[0].id, "868s1");

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["description"], "Wait for approval");
        assert_eq!(value["custom_item_id"], 1018);
    }
}
