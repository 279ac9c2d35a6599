//! Custom field map for the escalation workflow.

use std::collections::HashMap;

use clickup::FieldWrite;
use clickup::Task;
use serde::Serialize;
use serde_json::Value;

/// Logical escalation fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    ReasonText,
    AiSummary,
    AiSuggestion,
    Status,
    Response,
    ResolvedAt,
    SubmittedAt,
    AiGrade,
    History,
    Level,
    RfiStatus,
    RfiRequest,
    RfiResponse,
    PropertyLink,
}

/// Storage shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Dropdown,
    Date,
    Relation,
}

impl FieldKey {
    pub const ALL: [Self; 14] = [
        Self::ReasonText,
        Self::AiSummary,
        Self::AiSuggestion,
        Self::Status,
        Self::Response,
        Self::ResolvedAt,
        Self::SubmittedAt,
        Self::AiGrade,
        Self::History,
        Self::Level,
        Self::RfiStatus,
        Self::RfiRequest,
        Self::RfiResponse,
        Self::PropertyLink,
    ];

    /// Suffix of the `ESCALATION_FIELD_<KEY>` override variable.
    #[must_use]
    pub const fn env_suffix(self) -> &'static str {
        match self {
            Self::ReasonText => "REASON_TEXT",
            Self::AiSummary => "AI_SUMMARY",
            Self::AiSuggestion => "AI_SUGGESTION",
            Self::Status => "STATUS",
            Self::Response => "RESPONSE",
            Self::ResolvedAt => "RESOLVED_AT",
            Self::SubmittedAt => "SUBMITTED_AT",
            Self::AiGrade => "AI_GRADE",
            Self::History => "HISTORY",
            Self::Level => "LEVEL",
            Self::RfiStatus => "RFI_STATUS",
            Self::RfiRequest => "RFI_REQUEST",
            Self::RfiResponse => "RFI_RESPONSE",
            Self::PropertyLink => "PROPERTY_LINK",
        }
    }

    /// Production field UUID.
    #[must_use]
    pub const fn default_id(self) -> &'static str {
        match self {
            Self::ReasonText => "c6e0281e-9001-42d7-a265-8f5da6b71132",
            Self::AiSummary => "e9e831f2-b439-4067-8e88-6b715f4263b2",
            Self::AiSuggestion => "bc5e9359-01cd-408f-adb9-c7bdf1f2dd29",
            Self::Status => "8d784bd0-18e5-4db3-b45e-9a2900262e04",
            Self::Response => "a077ecc9-1a59-48af-b2cd-42a63f5a7f86",
            Self::ResolvedAt => "c40bf1c4-7d33-4b2b-8765-0784cd88591a",
            Self::SubmittedAt => "5ffd2b3e-b8dc-4bd0-819a-a3d4c3396a5f",
            Self::AiGrade => "629ca244-a6d3-46dd-9f1e-6a0ded40f519",
            Self::History => "94790367-5d1f-4300-8f79-e13819f910d4",
            Self::Level => "90d2fec8-7474-4221-84c0-b8c7fb5e4385",
            Self::RfiStatus => "f94c0b4b-0c70-4c23-9633-07af2fa6ddc6",
            Self::RfiRequest => "0e7dd6f8-3167-4df5-964e-574734ffd4ed",
            Self::RfiResponse => "b5c52661-8142-45e0-bec5-14f3c135edbc",
            Self::PropertyLink => "73999194-0433-433d-a27c-4d9c5f194fd0",
        }
    }

    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Status | Self::Level | Self::RfiStatus => FieldKind::Dropdown,
            Self::ResolvedAt | Self::SubmittedAt => FieldKind::Date,
            Self::PropertyLink => FieldKind::Relation,
            _ => FieldKind::Text,
        }
    }
}

/// Field UUIDs for every [`FieldKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationFields {
    ids: HashMap<FieldKey, String>,
}

impl Default for EscalationFields {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl EscalationFields {
    /// Production UUIDs with `ESCALATION_FIELD_<KEY>` overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the map, asking `lookup` for each override variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let ids = FieldKey::ALL
            .into_iter()
            .map(|key| {
                let id = lookup(&format!("ESCALATION_FIELD_{}", key.env_suffix()))
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| key.default_id().to_string());
                (key, id)
            })
            .collect();
        Self { ids }
    }

    /// UUID of a field.
    #[must_use]
    pub fn id(&self, key: FieldKey) -> &str {
        self.ids
            .get(&key)
            .map_or_else(|| key.default_id(), String::as_str)
    }

    /// The write that puts `key` back to its value in `task`.
    ///
    /// Relation fields only support additive writes and cannot be restored.
    #[must_use]
    pub fn restore_write(&self, task: &Task, key: FieldKey) -> Option<FieldWrite> {
        let id = self.id(key);
        match key.kind() {
            FieldKind::Text => Some(match task.field_value(id) {
                Some(Value::String(s)) => FieldWrite::Text(s.clone()),
                Some(other) => FieldWrite::Text(other.to_string()),
                None => FieldWrite::Clear,
            }),
            FieldKind::Dropdown => Some(
                task.ordinal_field(id)
                    .map_or(FieldWrite::Clear, FieldWrite::Dropdown),
            ),
            FieldKind::Date => Some(
                task.timestamp_field(id)
                    .map_or(FieldWrite::Clear, FieldWrite::Date),
            ),
            FieldKind::Relation => None,
        }
    }
}
