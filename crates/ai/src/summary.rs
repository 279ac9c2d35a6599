//! Escalation summaries.
//!
//! [`SummaryGenerator`] walks the configured providers and models in order.
//! When every attempt fails (or nothing is configured) it returns a templated
//! summary clearly labeled as non-AI, so callers never see an error from here.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::AiError;
use crate::provider::{AIMessage, AIProvider, GenerateOptions};

/// Label prefixed to every templated summary.
pub const FALLBACK_LABEL: &str = "[Automated summary - AI unavailable]";

/// `model_used` reported for templated summaries.
pub const FALLBACK_MODEL: &str = "fallback-template";

/// Upper bound on one summary request across all providers and models.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str =
    "You are a professional project manager creating escalation summaries.";

/// Snapshot of a task as sent by the browser.
///
/// `status` and `priority` arrive either as ClickUp objects
/// (`{"status": "open"}`) or as bare strings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub priority: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TaskSnapshot {
    fn label(value: Option<&Value>, key: &str) -> Option<String> {
        match value? {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj.get(key).and_then(Value::as_str).map(String::from),
            _ => None,
        }
        .filter(|s| !s.trim().is_empty())
    }

    /// Status label, if any.
    #[must_use]
    pub fn status_label(&self) -> Option<String> {
        Self::label(self.status.as_ref(), "status")
    }

    /// Priority label, if any.
    #[must_use]
    pub fn priority_label(&self) -> Option<String> {
        Self::label(self.priority.as_ref(), "priority")
    }
}

/// Context block of a summary request.
///
/// `{"task": null}` and a missing `task` key deserialize to the same value.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SummaryContext {
    #[serde(default)]
    pub task: Option<TaskSnapshot>,
    #[serde(default)]
    pub parent_task: Option<TaskSnapshot>,
}

/// Body of `POST /api/ai/generate-escalation-summary`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub context: Option<SummaryContext>,
}

impl SummaryRequest {
    fn task(&self) -> Option<&TaskSnapshot> {
        self.context.as_ref().and_then(|c| c.task.as_ref())
    }

    fn parent_task(&self) -> Option<&TaskSnapshot> {
        self.context.as_ref().and_then(|c| c.parent_task.as_ref())
    }

    /// Task id from the request or its task snapshot, `"unknown"` if neither.
    #[must_use]
    pub fn task_id(&self) -> &str {
        self.task_id
            .as_deref()
            .or_else(|| self.task().and_then(|t| t.id.as_deref()))
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
    }

    fn task_name(&self) -> &str {
        self.task()
            .and_then(|t| t.name.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown Task")
    }

    fn reason(&self) -> &str {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("No reason provided")
    }

    /// User prompt sent to the model.
    #[must_use]
    pub fn prompt(&self) -> String {
        let task = self.task();
        let status = task
            .and_then(TaskSnapshot::status_label)
            .unwrap_or_else(|| "Unknown".to_string());
        let priority = task
            .and_then(TaskSnapshot::priority_label)
            .unwrap_or_else(|| "None".to_string());

        let mut context = format!("- Status: {status}\n- Priority: {priority}");
        if let Some(parent) = self.parent_task().and_then(|p| p.name.as_deref()) {
            context.push_str(&format!("\n- Parent task: {parent}"));
        }

        format!(
            "You are an expert project manager helping to prioritize task escalations.\n\n\
             ESCALATION REQUEST:\n\
             - Task: {name} (ID: {id})\n\
             - Reason for escalation: {reason}\n\n\
             TASK CONTEXT:\n\
             {context}\n\n\
             Please provide a concise escalation summary that:\n\
             1. Clearly explains the issue and why it needs attention\n\
             2. Provides relevant context about the task\n\
             3. Suggests a priority level and recommended timeline for resolution\n\
             4. Keeps the summary under 300 words\n\n\
             Format your response as a professional escalation summary.",
            name = self.task_name(),
            id = self.task_id(),
            reason = self.reason(),
        )
    }

    /// Templated summary used when no model answers.
    #[must_use]
    pub fn fallback_summary(&self) -> String {
        let task = self.task();
        let mut summary = format!(
            "{FALLBACK_LABEL}\n\nEscalation for task \"{}\" (ID: {}).\n\nReason: {}",
            self.task_name(),
            self.task_id(),
            self.reason(),
        );
        if let Some(status) = task.and_then(TaskSnapshot::status_label) {
            summary.push_str(&format!("\nCurrent status: {status}"));
        }
        if let Some(priority) = task.and_then(TaskSnapshot::priority_label) {
            summary.push_str(&format!("\nPriority: {priority}"));
        }
        if let Some(parent) = self.parent_task().and_then(|p| p.name.as_deref()) {
            summary.push_str(&format!("\nParent task: {parent}"));
        }
        summary.push_str("\n\nPlease review the task details and respond to the employee.");
        summary
    }
}

/// A generated (or templated) summary.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub summary: String,
    pub model_used: String,
    pub fallback: bool,
}

/// Generates escalation summaries with provider/model fallback.
#[derive(Clone)]
pub struct SummaryGenerator {
    providers: Vec<Arc<dyn AIProvider>>,
    models: Vec<String>,
    timeout: Duration,
    deadline: Duration,
    options: GenerateOptions,
}

impl SummaryGenerator {
    /// Create a generator. Providers and models are tried in the given order,
    /// each attempt bounded by `timeout`.
    #[must_use]
    pub fn new(
        providers: Vec<Arc<dyn AIProvider>>,
        models: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            providers,
            models,
            timeout,
            deadline: DEFAULT_DEADLINE,
            options: GenerateOptions {
                temperature: Some(0.7),
                max_tokens: Some(400),
            },
        }
    }

    /// A generator that always uses the template.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Vec::new(), Vec::new(), Duration::ZERO)
    }

    /// Bound the whole request; once it passes the template is served.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Whether any provider is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.providers.is_empty() && !self.models.is_empty()
    }

    /// Produce a summary. Never fails: exhausted providers, or a request that
    /// outlives the deadline, yield the template.
    pub async fn generate(&self, request: &SummaryRequest) -> Summary {
        if self.is_enabled() {
            match tokio::time::timeout(self.deadline, self.first_answer(request)).await {
                Ok(Some(summary)) => return summary,
                Ok(None) => {
                    warn!(
                        task_id = request.task_id(),
                        "All summary attempts failed, using template"
                    );
                }
                Err(_) => {
                    warn!(
                        task_id = request.task_id(),
                        deadline_secs = self.deadline.as_secs(),
                        "Summary deadline passed, using template"
                    );
                }
            }
        }

        Summary {
            summary: request.fallback_summary(),
            model_used: FALLBACK_MODEL.to_string(),
            fallback: true,
        }
    }

    /// Try every provider and model in order until one answers.
    async fn first_answer(&self, request: &SummaryRequest) -> Option<Summary> {
        let messages = [AIMessage::system(SYSTEM_PROMPT), AIMessage::user(request.prompt())];

        for provider in &self.providers {
            for model in &self.models {
                debug!(
                    provider = provider.name(),
                    model = %model,
                    "Requesting escalation summary"
                );
                let attempt = tokio::time::timeout(
                    self.timeout,
                    provider.generate_text(model, &messages, &self.options),
                )
                .await
                .map_err(AiError::from)
                .and_then(|r| r);

                match attempt {
                    Ok(response) => {
                        info!(
                            provider = provider.name(),
                            model = %model,
                            tokens = response.usage.total_tokens,
                            "Escalation summary generated"
                        );
                        return Some(Summary {
                            summary: response.text,
                            model_used: model.clone(),
                            fallback: false,
                        });
                    }
                    Err(e) => {
                        warn!(
                            provider = provider.name(),
                            model = %model,
                            error = %e,
                            "Summary attempt failed"
                        );
                    }
                }
            }
        }
        None
    }
}
