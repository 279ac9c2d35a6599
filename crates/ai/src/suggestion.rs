//! AI suggestions produced by an external workflow engine (n8n).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{AiError, AiResult};

/// Source of AI suggestions for a newly escalated task.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Produce a suggestion for `task_id` given its property link ids.
    async fn suggest(&self, task_id: &str, property_link: &[String]) -> AiResult<String>;
}

#[derive(Debug, Serialize)]
struct SuggestionRequest<'a> {
    task_id: &'a str,
    property_link: &'a [String],
}

#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    suggestion: Option<String>,
}

/// Suggestion source backed by an n8n webhook.
///
/// Posts `{task_id, property_link}` and reads `{suggestion}` back.
#[derive(Debug, Clone)]
pub struct WorkflowSuggester {
    client: Client,
    webhook_url: String,
}

impl WorkflowSuggester {
    /// Create a suggester for the given webhook.
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> AiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::NotConfigured(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }
}

#[async_trait]
impl SuggestionSource for WorkflowSuggester {
    #[instrument(skip(self, property_link), fields(task_id = %task_id))]
    async fn suggest(&self, task_id: &str, property_link: &[String]) -> AiResult<String> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&SuggestionRequest {
                task_id,
                property_link,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SuggestionResponse = response.json().await?;
        let suggestion = body
            .suggestion
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(AiError::EmptyResponse)?;

        debug!(chars = suggestion.len(), "Workflow suggestion received");
        Ok(suggestion)
    }
}
