//! LLM and workflow-engine integrations for the task helper.
//!
//! This crate provides:
//! - The [`AIProvider`] trait and OpenAI chat / legacy-completions providers
//! - A startup capability check that orders providers for the endpoint
//! - [`SummaryGenerator`], which never fails and falls back to a labeled template
//! - [`SuggestionSource`] and the n8n-backed [`WorkflowSuggester`]

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod openai;
pub mod provider;
pub mod suggestion;
pub mod summary;

pub use error::{AiError, AiResult};
pub use openai::{
    detect_providers, Detection, OpenAIChatProvider, OpenAILegacyProvider, OpenAISettings,
    OPENAI_API_URL,
};
pub use provider::{AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, TokenUsage};
pub use suggestion::{SuggestionSource, WorkflowSuggester};
pub use summary::{
    Summary, SummaryContext, SummaryGenerator, SummaryRequest, TaskSnapshot, DEFAULT_DEADLINE,
    FALLBACK_LABEL, FALLBACK_MODEL,
};
