//! Wait-node approvals for task helper pages.
//!
//! A wait node is a process-library step that pauses until a person approves
//! the action the AI proposed. This crate provides:
//! - The wait-node field map ([`WaitNodeFields`]) with production UUIDs
//! - Hierarchy walks to the process-library root and the business task
//! - [`WaitNodeService`], which loads the page data and applies approvals
//!   with per-field error reporting
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use clickup::{ClickUpClient, ClickUpSettings, TaskRef};
//! use wait_node::{WaitNodeFields, WaitNodeService};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClickUpClient::new(ClickUpSettings::new("pk_123", "9011954126"))?;
//! let service = WaitNodeService::new(Arc::new(client), WaitNodeFields::from_env());
//!
//! let view = service.initialize(&TaskRef::parse("868fg1umj")?).await?;
//! println!("{} steps under {}", view.subtasks.len(), view.root_task.name);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod fields;
pub mod hierarchy;
pub mod service;

pub use error::{FieldFailure, WaitNodeError, WaitNodeResult};
pub use fields::{WaitField, WaitNodeFields};
pub use hierarchy::{find_main_parent, find_process_root, DEFAULT_MAX_DEPTH, PROCESS_LIBRARY_TYPE};
pub use service::{ApprovalOutcome, WaitNodeService, WaitNodeView, DEFAULT_VERIFY_DELAY};
