//! REST client for the ClickUp v2 API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Response, StatusCode, Url};
use tracing::{debug, instrument};

use crate::error::{ClickUpError, ClickUpResult};
use crate::models::{FieldWrite, Task};
use crate::retry::RetryPolicy;
use crate::store::TaskStore;
use crate::task_ref::TaskRef;

/// ClickUp API endpoint
pub const CLICKUP_API_URL: &str = "https://api.clickup.com/api/v2";

/// Fallback wait when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Connection settings for [`ClickUpClient`].
#[derive(Debug, Clone)]
pub struct ClickUpSettings {
    /// Personal API token, sent verbatim in `Authorization`.
    pub api_token: String,
    /// Workspace (team) id, required for custom alias lookups.
    pub team_id: String,
    /// API root, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl ClickUpSettings {
    /// Settings against the public API with default timeout and retries.
    #[must_use]
    pub fn new(api_token: impl Into<String>, team_id: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            team_id: team_id.into(),
            base_url: CLICKUP_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    /// Point the client at another API root (mock servers, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// ClickUp REST client
#[derive(Debug, Clone)]
pub struct ClickUpClient {
    client: reqwest::Client,
    base_url: Url,
    team_id: String,
    retry: RetryPolicy,
}

impl ClickUpClient {
    /// Create a new client.
    ///
    /// # Errors
    /// Returns [`ClickUpError::Config`] if the token is not a valid header
    /// value, the base URL cannot carry a path, or the HTTP client cannot be
    /// built.
    pub fn new(settings: ClickUpSettings) -> ClickUpResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&settings.api_token)
                .map_err(|e| ClickUpError::Config(format!("invalid API token: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let base_url = Url::parse(settings.base_url.trim_end_matches('/'))
            .map_err(|e| ClickUpError::Config(format!("invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClickUpError::Config(format!(
                "base URL {base_url} cannot carry a path"
            )));
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ClickUpError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            team_id: settings.team_id,
            retry: settings.retry,
        })
    }

    /// Workspace id used for alias lookups.
    #[must_use]
    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    /// Endpoint URL with each segment percent-encoded as a single segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // =========================================================================
    // Task Operations
    // =========================================================================

    /// Fetch a task by canonical id or custom alias.
    ///
    /// # Errors
    /// Returns [`ClickUpError::NotFound`] on 404, other variants on failure.
    #[instrument(skip(self), fields(task = %task))]
    pub async fn get_task(&self, task: &TaskRef) -> ClickUpResult<Task> {
        self.fetch_task(task, false).await
    }

    /// Fetch a task together with the ids of its direct subtasks.
    ///
    /// # Errors
    /// Returns [`ClickUpError::NotFound`] on 404, other variants on failure.
    #[instrument(skip(self), fields(task = %task))]
    pub async fn get_task_with_subtasks(&self, task: &TaskRef) -> ClickUpResult<Task> {
        self.fetch_task(task, true).await
    }

    async fn fetch_task(&self, task: &TaskRef, include_subtasks: bool) -> ClickUpResult<Task> {
        let url = self.endpoint(&["task", task.as_str()]);
        let mut query: Vec<(&str, &str)> = Vec::new();
        if task.is_custom() {
            query.push(("custom_task_ids", "true"));
            query.push(("team_id", self.team_id.as_str()));
        }
        if include_subtasks {
            query.push(("include_subtasks", "true"));
        }

        let (client, url, query) = (&self.client, &url, &query);
        self.retry
            .run("get_task", move || async move {
                let response = client.get(url.clone()).query(query).send().await?;
                let response = check_status(response, task.as_str()).await?;
                let task: Task = response.json().await?;
                Ok(task)
            })
            .await
            .inspect(|t| {
                debug!(
                    task_id = %t.id,
                    fields = t.custom_fields.len(),
                    subtasks = t.subtasks.len(),
                    "Fetched task"
                );
            })
    }

    /// Write a single custom field on a task.
    ///
    /// `task_id` must be canonical; ClickUp rejects aliases on writes.
    ///
    /// # Errors
    /// Returns an error if ClickUp rejects the write or is unreachable.
    #[instrument(skip(self, write), fields(task_id = %task_id, field_id = %field_id))]
    pub async fn set_field(
        &self,
        task_id: &str,
        field_id: &str,
        write: &FieldWrite,
    ) -> ClickUpResult<()> {
        let url = self.endpoint(&["task", task_id, "field", field_id]);
        let body = write.to_body();

        let (client, url, body) = (&self.client, &url, &body);
        self.retry
            .run("set_field", move || async move {
                let request = match body {
                    Some(body) => client.post(url.clone()).json(body),
                    None => client.delete(url.clone()),
                };
                let response = request.send().await?;
                check_status(response, task_id).await?;
                Ok(())
            })
            .await?;

        debug!("Custom field written");
        Ok(())
    }

    /// Remove a custom field's value.
    ///
    /// # Errors
    /// Returns an error if ClickUp rejects the request or is unreachable.
    pub async fn clear_field(&self, task_id: &str, field_id: &str) -> ClickUpResult<()> {
        self.set_field(task_id, field_id, &FieldWrite::Clear).await
    }
}

#[async_trait]
impl TaskStore for ClickUpClient {
    async fn get_task(&self, task: &TaskRef) -> ClickUpResult<Task> {
        Self::get_task(self, task).await
    }

    async fn get_task_with_subtasks(&self, task: &TaskRef) -> ClickUpResult<Task> {
        Self::get_task_with_subtasks(self, task).await
    }

    async fn set_field(
        &self,
        task_id: &str,
        field_id: &str,
        write: &FieldWrite,
    ) -> ClickUpResult<()> {
        Self::set_field(self, task_id, field_id, write).await
    }
}

/// Map non-success responses onto [`ClickUpError`].
async fn check_status(response: Response, task: &str) -> ClickUpResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::NOT_FOUND => Err(ClickUpError::NotFound(task.to_string())),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            Err(ClickUpError::RateLimited { retry_after_secs })
        }
        _ => {
            let message = response.text().await.unwrap_or_default();
            Err(ClickUpError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
