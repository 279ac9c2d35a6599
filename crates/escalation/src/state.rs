//! Escalation state machine.
//!
//! The status dropdown is the single source of truth for the workflow state:
//!
//! | ordinal | meaning |
//! |---|---|
//! | 0 | not escalated |
//! | 1 | escalated, level 1 |
//! | 2 | resolved |
//! | 3 | escalated, level 2 |
//! | 4 | awaiting information |
//!
//! Awaiting-information is shared by both levels; the level dropdown
//! (0 = level 1, 1 = level 2) says which reviewer asked. The RFI status
//! dropdown is bookkeeping only and never changes the decoded state.
//!
//! Transitions are listed once in [`TRANSITIONS`]; every handler goes through
//! [`transition`] and nothing else decides what is allowed.

use std::fmt;

use serde::{Deserialize, Serialize};

use self::Action as A;
use self::EscalationState as S;

/// Escalation tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "level_1")]
    L1,
    #[serde(rename = "level_2")]
    L2,
}

impl Level {
    #[must_use]
    pub const fn ordinal(self) -> u32 {
        match self {
            Self::L1 => 0,
            Self::L2 => 1,
        }
    }

    #[must_use]
    pub const fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            0 => Some(Self::L1),
            1 => Some(Self::L2),
            _ => None,
        }
    }
}

/// State of an information request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfiStatus {
    Requested,
    Completed,
}

impl RfiStatus {
    #[must_use]
    pub const fn ordinal(self) -> u32 {
        match self {
            Self::Requested => 0,
            Self::Completed => 1,
        }
    }

    #[must_use]
    pub const fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Requested),
            1 => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    NotEscalated,
    #[serde(rename = "escalated_level_1")]
    EscalatedL1,
    #[serde(rename = "escalated_level_1_awaiting_info")]
    EscalatedL1AwaitingInfo,
    #[serde(rename = "escalated_level_2")]
    EscalatedL2,
    #[serde(rename = "escalated_level_2_awaiting_info")]
    EscalatedL2AwaitingInfo,
    Resolved,
}

/// Why a stored record could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    UnknownStatus(u32),
    UnknownLevel(u32),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStatus(n) => write!(f, "unknown escalation status ordinal {n}"),
            Self::UnknownLevel(n) => write!(f, "unknown escalation level ordinal {n}"),
        }
    }
}

impl EscalationState {
    pub const ALL: [Self; 6] = [
        Self::NotEscalated,
        Self::EscalatedL1,
        Self::EscalatedL1AwaitingInfo,
        Self::EscalatedL2,
        Self::EscalatedL2AwaitingInfo,
        Self::Resolved,
    ];

    /// Decode the status and level dropdowns.
    ///
    /// An unset status is `NotEscalated`. The level only matters for
    /// status 4; an unset level there means level 1.
    pub fn decode(status: Option<u32>, level: Option<u32>) -> Result<Self, DecodeError> {
        match status.unwrap_or(0) {
            0 => Ok(Self::NotEscalated),
            1 => Ok(Self::EscalatedL1),
            2 => Ok(Self::Resolved),
            3 => Ok(Self::EscalatedL2),
            4 => match level.map(|l| Level::from_ordinal(l).ok_or(DecodeError::UnknownLevel(l))) {
                None | Some(Ok(Level::L1)) => Ok(Self::EscalatedL1AwaitingInfo),
                Some(Ok(Level::L2)) => Ok(Self::EscalatedL2AwaitingInfo),
                Some(Err(e)) => Err(e),
            },
            other => Err(DecodeError::UnknownStatus(other)),
        }
    }

    /// Ordinal written to the status dropdown.
    #[must_use]
    pub const fn status_ordinal(self) -> u32 {
        match self {
            Self::NotEscalated => 0,
            Self::EscalatedL1 => 1,
            Self::Resolved => 2,
            Self::EscalatedL2 => 3,
            Self::EscalatedL1AwaitingInfo | Self::EscalatedL2AwaitingInfo => 4,
        }
    }

    /// Tier the state belongs to, if any.
    #[must_use]
    pub const fn level(self) -> Option<Level> {
        match self {
            Self::EscalatedL1 | Self::EscalatedL1AwaitingInfo => Some(Level::L1),
            Self::EscalatedL2 | Self::EscalatedL2AwaitingInfo => Some(Level::L2),
            Self::NotEscalated | Self::Resolved => None,
        }
    }

    #[must_use]
    pub const fn is_awaiting_info(self) -> bool {
        matches!(self, Self::EscalatedL1AwaitingInfo | Self::EscalatedL2AwaitingInfo)
    }

    /// Escalated and still open, including while awaiting information.
    #[must_use]
    pub const fn is_open(self) -> bool {
        self.level().is_some()
    }

    /// Actions the table allows from this state.
    #[must_use]
    pub fn allowed_actions(self) -> Vec<Action> {
        TRANSITIONS
            .iter()
            .filter(|t| t.from == self)
            .map(|t| t.action)
            .collect()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotEscalated => "not_escalated",
            Self::EscalatedL1 => "escalated_level_1",
            Self::EscalatedL1AwaitingInfo => "escalated_level_1_awaiting_info",
            Self::EscalatedL2 => "escalated_level_2",
            Self::EscalatedL2AwaitingInfo => "escalated_level_2_awaiting_info",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for EscalationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something a user does to an escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Employee escalates the task.
    Submit,
    /// Reviewer answers and resolves.
    Answer,
    /// Reviewer asks the employee for more information.
    RequestInfo,
    /// Level 1 reviewer hands the escalation to level 2.
    #[serde(rename = "escalate_to_level_2")]
    EscalateToLevel2,
    /// Employee answers an information request.
    RespondToRfi,
}

impl Action {
    pub const ALL: [Self; 5] = [
        Self::Submit,
        Self::Answer,
        Self::RequestInfo,
        Self::EscalateToLevel2,
        Self::RespondToRfi,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Answer => "answer",
            Self::RequestInfo => "request_info",
            Self::EscalateToLevel2 => "escalate_to_level_2",
            Self::RespondToRfi => "respond_to_rfi",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a transition does to the RFI status dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfiEffect {
    Keep,
    Clear,
    Set(RfiStatus),
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: EscalationState,
    pub action: Action,
    pub to: EscalationState,
    pub rfi: RfiEffect,
}

const fn row(
    from: EscalationState,
    action: Action,
    to: EscalationState,
    rfi: RfiEffect,
) -> Transition {
    Transition {
        from,
        action,
        to,
        rfi,
    }
}

const REQUESTED: RfiEffect = RfiEffect::Set(RfiStatus::Requested);
const COMPLETED: RfiEffect = RfiEffect::Set(RfiStatus::Completed);

/// Every allowed transition. Anything not listed is rejected.
pub const TRANSITIONS: &[Transition] = &[
    row(S::NotEscalated, A::Submit, S::EscalatedL1, RfiEffect::Clear),
    row(S::EscalatedL1, A::Answer, S::Resolved, RfiEffect::Keep),
    row(S::EscalatedL1, A::RequestInfo, S::EscalatedL1AwaitingInfo, REQUESTED),
    row(S::EscalatedL1, A::EscalateToLevel2, S::EscalatedL2, RfiEffect::Clear),
    row(S::EscalatedL2, A::Answer, S::Resolved, RfiEffect::Keep),
    row(S::EscalatedL2, A::RequestInfo, S::EscalatedL2AwaitingInfo, REQUESTED),
    row(S::EscalatedL1AwaitingInfo, A::RespondToRfi, S::EscalatedL1, COMPLETED),
    row(S::EscalatedL2AwaitingInfo, A::RespondToRfi, S::EscalatedL2, COMPLETED),
];

/// Look up the transition for `action` from `from`.
#[must_use]
pub fn transition(from: EscalationState, action: Action) -> Option<&'static Transition> {
    TRANSITIONS
        .iter()
        .find(|t| t.from == from && t.action == action)
}
