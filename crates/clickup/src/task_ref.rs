//! Task identifiers.
//!
//! ClickUp tasks are addressed either by their canonical id (`868fg1umj`) or
//! by a workspace-defined custom alias (`TICKET-65711`). Aliases are only
//! accepted on reads, and only together with `custom_task_ids=true` and the
//! team id; writes must use the canonical id.
//!
//! Identifiers arrive in URL paths, so [`TaskRef::parse`] only accepts the
//! two shapes ClickUp issues and rejects anything that could change the
//! request path.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Longest identifier accepted from callers.
pub const MAX_TASK_REF_LEN: usize = 64;

/// A reference to a ClickUp task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskRef {
    /// Canonical task id (lowercase alphanumeric).
    Canonical(String),
    /// Custom task alias such as `TICKET-65711`.
    Custom(String),
}

/// Why a raw identifier was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTaskRef {
    #[error("task id is empty")]
    Empty,

    #[error("task id is longer than {MAX_TASK_REF_LEN} characters")]
    TooLong,

    #[error("task id contains unsupported character {0:?}")]
    BadCharacter(char),
}

impl TaskRef {
    /// Classify and validate a raw identifier.
    ///
    /// Canonical ids are lowercase ASCII alphanumerics. Anything else made of
    /// ASCII alphanumerics, `-` and `_` is a custom alias, as is any id that
    /// mentions `TICKET`.
    pub fn parse(raw: &str) -> Result<Self, InvalidTaskRef> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(InvalidTaskRef::Empty);
        }
        if raw.len() > MAX_TASK_REF_LEN {
            return Err(InvalidTaskRef::TooLong);
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(InvalidTaskRef::BadCharacter(c));
        }

        let canonical = raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if canonical && !raw.contains("ticket") {
            Ok(Self::Canonical(raw.to_string()))
        } else {
            Ok(Self::Custom(raw.to_string()))
        }
    }

    /// The identifier as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Canonical(id) | Self::Custom(id) => id,
        }
    }

    /// Whether the reference is a custom alias.
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskRef {
    type Err = InvalidTaskRef;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}
