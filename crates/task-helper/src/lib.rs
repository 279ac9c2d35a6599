//! Task helper HTTP service.
//!
//! Serves the API behind the task helper pages:
//! - Escalation submission, supervisor decisions and information requests
//! - Property-link validation with copy-down from parent tasks
//! - AI escalation summaries with a template fallback
//!
//! Every `/api` route sits behind a signed session cookie and a per-user
//! rate limit.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod server;

pub use auth::{Session, SessionError, SessionSigner};
pub use config::Config;
pub use error::ApiError;
pub use rate_limit::{RateLimitError, RateLimiter, RateLimits, RouteClass};
pub use server::{build_router, AppState};
