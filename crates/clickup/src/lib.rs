//! ClickUp v2 API client for the task helper.
//!
//! This crate provides:
//! - Task identifiers that tell canonical ids from custom aliases
//! - A REST client for task reads and typed custom-field writes
//! - Bounded retry with jitter for transient failures
//! - The [`TaskStore`] seam the escalation engine is written against
//!
//! # Usage
//!
//! ```no_run
//! use clickup::{ClickUpClient, ClickUpSettings, TaskRef};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClickUpClient::new(ClickUpSettings::new("pk_123", "9011954126"))?;
//! let task = client.get_task(&TaskRef::parse("TICKET-65711")?).await?;
//! println!("{} ({})", task.name, task.id);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod models;
pub mod retry;
pub mod store;
pub mod task_ref;

pub use client::{ClickUpClient, ClickUpSettings, CLICKUP_API_URL};
pub use error::{ClickUpError, ClickUpResult};
#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryTaskStore, RecordedWrite};
pub use models::{CustomField, FieldWrite, SubtaskRef, Task, TaskPriority, TaskStatus};
pub use retry::RetryPolicy;
pub use store::TaskStore;
pub use task_ref::{InvalidTaskRef, TaskRef, MAX_TASK_REF_LEN};
