//! Append-only transition log stored in the History text field.
//!
//! The field holds a JSON array. Each RFI question and answer is recorded
//! here, so the RFI text fields can be overwritten without losing a round.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{Action, EscalationState};

/// Action name recorded for content that predates the JSON format.
pub const LEGACY_ACTION: &str = "legacy";

/// One entry in the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HistoryEntry {
    /// Entry for a state transition.
    #[must_use]
    pub fn transition(
        at: DateTime<Utc>,
        action: Action,
        from: EscalationState,
        to: EscalationState,
        actor: Option<&str>,
        detail: Option<&str>,
    ) -> Self {
        Self {
            at,
            action: action.as_str().to_string(),
            from: Some(from.as_str().to_string()),
            to: Some(to.as_str().to_string()),
            actor: actor.map(String::from),
            detail: detail.map(String::from),
        }
    }
}

/// Parse the stored log.
///
/// Empty means no history. Anything that is not a JSON array of entries is
/// kept verbatim as a single legacy entry.
#[must_use]
pub fn parse(raw: Option<&str>, now: DateTime<Utc>) -> Vec<HistoryEntry> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };

    serde_json::from_str(raw).unwrap_or_else(|_| {
        vec![HistoryEntry {
            at: now,
            action: LEGACY_ACTION.to_string(),
            from: None,
            to: None,
            actor: None,
            detail: Some(raw.to_string()),
        }]
    })
}

/// Serialize the log for storage.
#[must_use]
pub fn render(entries: &[HistoryEntry]) -> String {
    serde_json::to_string(entries).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_empty_is_no_history() {
        assert!(parse(None, at(0)).is_empty());
        assert!(parse(Some("  "), at(0)).is_empty());
    }

    #[test]
    fn test_round_trip() {
        let entries = vec![HistoryEntry::transition(
            at(1_733_482_800),
            Action::RequestInfo,
            EscalationState::EscalatedL1,
            EscalationState::EscalatedL1AwaitingInfo,
            Some("lead@example.com"),
            Some("Which unit?"),
        )];
        let rendered = render(&entries);
        assert!(rendered.contains("\"action\":\"request_info\""));
        assert_eq!(parse(Some(&rendered), at(0)), entries);
    }

    #[test]
    fn test_free_text_is_kept_as_legacy() {
        let entries = parse(Some("Escalated by Bob on Monday"), at(5));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, LEGACY_ACTION);
        assert_eq!(entries[0].detail.as_deref(), Some("Escalated by Bob on Monday"));
        assert_eq!(entries[0].at, at(5));
    }
}
