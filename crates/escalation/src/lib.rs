//! Escalation workflow for task helper pages.
//!
//! Escalations live entirely in ClickUp custom fields. This crate provides:
//! - The field map ([`EscalationFields`]) with production UUIDs
//! - An explicit state enum and a data-driven transition table
//! - Record decoding that trusts the status dropdown alone
//! - Property-link resolution with copy-down from ancestors
//! - [`EscalationService`], which executes transitions under a per-task lock
//!   and rolls back partially applied writes
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use clickup::{ClickUpClient, ClickUpSettings, TaskRef};
//! use escalation::{EscalationFields, EscalationService, SubmitInput};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClickUpClient::new(ClickUpSettings::new("pk_123", "9011954126"))?;
//! let service = EscalationService::new(Arc::new(client), EscalationFields::from_env());
//!
//! let input = SubmitInput {
//!     reason: "Leak in unit 4".to_string(),
//!     ai_summary: None,
//! };
//! let outcome = service
//!     .submit(&TaskRef::parse("TICKET-65711")?, &input, Some("tech@example.com"))
//!     .await?;
//! println!("{} -> {}", outcome.transition.from, outcome.transition.to);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod fields;
pub mod history;
pub mod lock;
pub mod property_link;
pub mod record;
pub mod service;
pub mod state;

pub use error::{EscalationError, EscalationResult};
pub use fields::{EscalationFields, FieldKey};
pub use history::HistoryEntry;
pub use property_link::{LinkOrigin, ResolvedLink, DEFAULT_MAX_DEPTH};
pub use record::EscalationRecord;
pub use service::{
    EscalationService, SubmitInput, SubmitOutcome, SuggestionOutcome, TransitionOutcome,
};
pub use state::{transition, Action, EscalationState, Level, RfiStatus, TRANSITIONS};
