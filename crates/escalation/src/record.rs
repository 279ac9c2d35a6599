//! Escalation record decoded from a task's custom fields.

use chrono::{DateTime, Utc};
use clickup::Task;
use serde::Serialize;

use crate::error::{EscalationError, EscalationResult};
use crate::fields::{EscalationFields, FieldKey};
use crate::history::{self, HistoryEntry};
use crate::state::{Action, EscalationState, Level, RfiStatus};

/// Everything the escalation workflow stores on a task.
#[derive(Debug, Clone, Serialize)]
pub struct EscalationRecord {
    /// Canonical task id.
    pub task_id: String,
    pub custom_id: Option<String>,
    pub name: String,
    pub state: EscalationState,
    /// Raw level dropdown, independent of `state`.
    pub level: Option<Level>,
    pub rfi_status: Option<RfiStatus>,
    pub reason: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_suggestion: Option<String>,
    pub ai_grade: Option<String>,
    pub response: Option<String>,
    pub rfi_request: Option<String>,
    pub rfi_response: Option<String>,
    /// Unix ms.
    pub submitted_at: Option<i64>,
    /// Unix ms.
    pub resolved_at: Option<i64>,
    pub property_link: Vec<String>,
    pub history: Vec<HistoryEntry>,
}

impl EscalationRecord {
    /// Decode the record from a fetched task.
    ///
    /// The status dropdown alone decides the state. Unknown status or level
    /// ordinals are reported as [`EscalationError::CorruptRecord`]; an unknown
    /// RFI status ordinal is ignored.
    pub fn from_task(
        task: &Task,
        fields: &EscalationFields,
        now: DateTime<Utc>,
    ) -> EscalationResult<Self> {
        let text = |key| task.text_field(fields.id(key));
        let level_raw = task.ordinal_field(fields.id(FieldKey::Level));

        let status_raw = task.ordinal_field(fields.id(FieldKey::Status));
        let state = EscalationState::decode(status_raw, level_raw)
            .map_err(|e| EscalationError::CorruptRecord {
                task_id: task.id.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            task_id: task.id.clone(),
            custom_id: task.custom_id.clone(),
            name: task.name.clone(),
            state,
            level: level_raw.and_then(Level::from_ordinal),
            rfi_status: task
                .ordinal_field(fields.id(FieldKey::RfiStatus))
                .and_then(RfiStatus::from_ordinal),
            reason: text(FieldKey::ReasonText),
            ai_summary: text(FieldKey::AiSummary),
            ai_suggestion: text(FieldKey::AiSuggestion),
            ai_grade: text(FieldKey::AiGrade),
            response: text(FieldKey::Response),
            rfi_request: text(FieldKey::RfiRequest),
            rfi_response: text(FieldKey::RfiResponse),
            submitted_at: task.timestamp_field(fields.id(FieldKey::SubmittedAt)),
            resolved_at: task.timestamp_field(fields.id(FieldKey::ResolvedAt)),
            property_link: task.relation_ids(fields.id(FieldKey::PropertyLink)),
            history: history::parse(text(FieldKey::History).as_deref(), now),
        })
    }

    /// Actions allowed from the current state.
    #[must_use]
    pub fn allowed_actions(&self) -> Vec<Action> {
        self.state.allowed_actions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(fields: &EscalationFields, values: &[(FieldKey, serde_json::Value)]) -> Task {
        let custom_fields: Vec<_> = values
            .iter()
            .map(|(k, v)| json!({"id": fields.id(*k), "value": v}))
            .collect();
        serde_json::from_value(json!({
            "id": "868abc",
            "custom_id": "TICKET-1",
            "name": "Leak in unit 4",
            "custom_fields": custom_fields,
        }))
        .unwrap()
    }

    #[test]
    fn test_blank_task_is_not_escalated() {
        let fields = EscalationFields::default();
        let record = EscalationRecord::from_task(&task(&fields, &[]), &fields, Utc::now()).unwrap();
        assert_eq!(record.state, EscalationState::NotEscalated);
        assert_eq!(record.allowed_actions(), vec![Action::Submit]);
        assert!(record.property_link.is_empty());
        assert!(record.history.is_empty());
    }

    #[test]
    fn test_awaiting_info_at_level_2() {
        let fields = EscalationFields::default();
        let record = EscalationRecord::from_task(
            &task(
                &fields,
                &[
                    (FieldKey::Status, json!(4)),
                    (FieldKey::Level, json!("1")),
                    (FieldKey::RfiStatus, json!(0)),
                    (FieldKey::RfiRequest, json!("Which unit?")),
                    (FieldKey::PropertyLink, json!([{"id": "PROP_A"}])),
                ],
            ),
            &fields,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(record.state, EscalationState::EscalatedL2AwaitingInfo);
        assert_eq!(record.level, Some(Level::L2));
        assert_eq!(record.rfi_status, Some(RfiStatus::Requested));
        assert_eq!(record.rfi_request.as_deref(), Some("Which unit?"));
        assert_eq!(record.property_link, vec!["PROP_A".to_string()]);
    }

    #[test]
    fn test_reason_text_does_not_imply_escalated() {
        let fields = EscalationFields::default();
        let record = EscalationRecord::from_task(
            &task(
                &fields,
                &[
                    (FieldKey::ReasonText, json!("leak")),
                    (FieldKey::AiSummary, json!("summary")),
                ],
            ),
            &fields,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(record.state, EscalationState::NotEscalated);
    }

    #[test]
    fn test_rfi_status_does_not_change_state() {
        let fields = EscalationFields::default();
        let record = EscalationRecord::from_task(
            &task(&fields, &[(FieldKey::Status, json!(1)), (FieldKey::RfiStatus, json!(0))]),
            &fields,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(record.state, EscalationState::EscalatedL1);
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        let fields = EscalationFields::default();
        let err = EscalationRecord::from_task(
            &task(&fields, &[(FieldKey::Status, json!(9))]),
            &fields,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "CORRUPT_RECORD");
    }
}
