//! Custom field map for wait-node tasks.

use std::collections::HashMap;

use serde::Serialize;

/// Fields the wait-node page reads and approves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitField {
    WaitConfig,
    WaitStatus,
    AiProposedAction,
    AiProposedValue,
    ProcessText,
    AccumulativeContext,
    StepInsights,
    StepNumber,
    Executed,
    HumanApprovedAction,
    HumanApprovedValue,
    LibraryLevel,
}

impl WaitField {
    pub const ALL: [Self; 12] = [
        Self::WaitConfig,
        Self::WaitStatus,
        Self::AiProposedAction,
        Self::AiProposedValue,
        Self::ProcessText,
        Self::AccumulativeContext,
        Self::StepInsights,
        Self::StepNumber,
        Self::Executed,
        Self::HumanApprovedAction,
        Self::HumanApprovedValue,
        Self::LibraryLevel,
    ];

    /// Suffix of the `WAIT_NODE_FIELD_<KEY>` override variable.
    #[must_use]
    pub const fn env_suffix(self) -> &'static str {
        match self {
            Self::WaitConfig => "WAIT_CONFIG",
            Self::WaitStatus => "WAIT_STATUS",
            Self::AiProposedAction => "AI_PROPOSED_ACTION",
            Self::AiProposedValue => "AI_PROPOSED_VALUE",
            Self::ProcessText => "PROCESS_TEXT",
            Self::AccumulativeContext => "ACCUMULATIVE_CONTEXT",
            Self::StepInsights => "STEP_INSIGHTS",
            Self::StepNumber => "STEP_NUMBER",
            Self::Executed => "EXECUTED",
            Self::HumanApprovedAction => "HUMAN_APPROVED_ACTION",
            Self::HumanApprovedValue => "HUMAN_APPROVED_VALUE",
            Self::LibraryLevel => "LIBRARY_LEVEL",
        }
    }

    /// Production field UUID.
    #[must_use]
    pub const fn default_id(self) -> &'static str {
        match self {
            Self::WaitConfig => "993f6a27-54e9-4901-a846-20f87a8694b0",
            Self::WaitStatus => "02486fba-7ddc-49fa-a18e-7a772d23132a",
            Self::AiProposedAction => "6c4ca5f9-d9eb-453a-8058-2cdfe40b0ea0",
            Self::AiProposedValue => "3c28debd-e8ea-446b-b145-afd982ffe9ce",
            Self::ProcessText => "b2587292-c1bc-4ee0-8dcb-a69db68d5fe8",
            Self::AccumulativeContext => "08cb7050-9860-44c8-960c-30862004f95b",
            Self::StepInsights => "d6fe462e-d163-488a-af80-7861c42c789b",
            Self::StepNumber => "68441ecb-470b-441c-ae24-916688595c05",
            Self::Executed => "13d4d660-432d-4033-9805-2ffc7d793c92",
            Self::HumanApprovedAction => "a441971f-6fa4-41fd-91d9-e38b31266698",
            Self::HumanApprovedValue => "6f6830f9-90f8-4614-a75d-0ab708c245b9",
            Self::LibraryLevel => "e49ccff6-f042-4e47-b452-0812ba128cfb",
        }
    }
}

/// Field UUIDs for every [`WaitField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitNodeFields {
    ids: HashMap<WaitField, String>,
}

impl Default for WaitNodeFields {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl WaitNodeFields {
    /// Production UUIDs with `WAIT_NODE_FIELD_<KEY>` overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the map, asking `lookup` for each override variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let ids = WaitField::ALL
            .into_iter()
            .map(|key| {
                let id = lookup(&format!("WAIT_NODE_FIELD_{}", key.env_suffix()))
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
    pub fn id(&self, key: WaitField) -> &str {
        self.ids
            .get(&key)
            .map_or_else(|| key.default_id(), String::as_str)
    }

    /// The wait-node field a raw UUID refers to.
    #[must_use]
    pub fn key_of(&self, field_id: &str) -> Option<WaitField> {
        WaitField::ALL
            .into_iter()
            .find(|key| self.id(*key) == field_id)
    }
}
