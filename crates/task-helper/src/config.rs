//! Configuration for the task helper service.

use std::env;
use std::time::Duration;

use ai::OPENAI_API_URL;
use clickup::{RetryPolicy, CLICKUP_API_URL};

use crate::rate_limit::RateLimits;

/// Task helper service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// ClickUp connection settings.
    pub clickup: ClickUpConfig,
    /// Summary and suggestion providers.
    pub ai: AiConfig,
    /// Secret used to verify session cookies.
    pub session_secret: Option<String>,
    /// Name of the session cookie.
    pub session_cookie_name: String,
    /// Per-user request budgets.
    pub rate_limits: RateLimits,
    /// Ancestors searched for a property link to copy.
    pub property_link_max_depth: u32,
    /// Origins allowed to call the API with credentials.
    pub cors_allowed_origins: Vec<String>,
    /// Wait-node approval settings.
    pub wait_node: WaitNodeConfig,
}

/// ClickUp API configuration.
#[derive(Debug, Clone)]
pub struct ClickUpConfig {
    /// Personal API token.
    pub api_token: Option<String>,
    /// Workspace id, needed for custom task id lookups.
    pub team_id: String,
    /// API root.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total attempts for transient failures.
    pub max_retries: u32,
}

/// Summary generation and workflow suggestion configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// OpenAI key; without it summaries use the template.
    pub openai_api_key: Option<String>,
    /// OpenAI-compatible API root.
    pub openai_base_url: String,
    /// Models tried in order.
    pub models: Vec<String>,
    /// Timeout for one summary attempt.
    pub timeout: Duration,
    /// Deadline for a whole summary request across every attempt.
    pub total_timeout: Duration,
    /// Workflow webhook returning a suggested next step.
    pub suggestion_webhook_url: Option<String>,
    /// Timeout for the suggestion webhook.
    pub suggestion_timeout: Duration,
}

/// Wait-node approval configuration.
#[derive(Debug, Clone)]
pub struct WaitNodeConfig {
    /// Custom task type of process-library tasks.
    pub process_library_type: u64,
    /// Ancestors visited when walking up the task tree.
    pub max_depth: u32,
    /// Pause before re-reading an approved task.
    pub verify_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

impl Config {
    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let number = |key: &str, default: u64| {
            var(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };
        let count = |key: &str, default: u32| {
            u32::try_from(number(key, u64::from(default))).unwrap_or(default)
        };
        let list = |key: &str| -> Option<Vec<String>> {
            var(key).map(|s| {
                s.split(',')
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect()
            })
        };

        Self {
            port: var("TASK_HELPER_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(5678),
            clickup: ClickUpConfig {
                api_token: var("CLICKUP_API_TOKEN"),
                team_id: var("CLICKUP_TEAM_ID").unwrap_or_default(),
                base_url: var("CLICKUP_BASE_URL")
                    .unwrap_or_else(|| CLICKUP_API_URL.to_string()),
                timeout: Duration::from_secs(number("CLICKUP_TIMEOUT_SECS", 10)),
                max_retries: count("CLICKUP_MAX_RETRIES", 3),
            },
            ai: AiConfig {
                openai_api_key: var("OPENAI_API_KEY"),
                openai_base_url: var("OPENAI_BASE_URL")
                    .unwrap_or_else(|| OPENAI_API_URL.to_string()),
                models: list("OPENAI_MODELS")
                    .filter(|models| !models.is_empty())
                    .unwrap_or_else(|| {
                        vec!["gpt-4".to_string(), "gpt-4-turbo-preview".to_string()]
                    }),
                timeout: Duration::from_secs(number("AI_TIMEOUT_SECS", 20)),
                total_timeout: Duration::from_secs(number("AI_TOTAL_TIMEOUT_SECS", 30)),
                suggestion_webhook_url: var("N8N_SUGGESTION_WEBHOOK_URL"),
                suggestion_timeout: Duration::from_secs(number("SUGGESTION_TIMEOUT_SECS", 15)),
            },
            session_secret: var("SESSION_SECRET"),
            session_cookie_name: var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|| "taskpages_session".to_string()),
            rate_limits: RateLimits {
                write_per_minute: count("RATE_LIMIT_WRITE_PER_MINUTE", 10),
                read_per_minute: count("RATE_LIMIT_READ_PER_MINUTE", 30),
                ai_per_minute: count("RATE_LIMIT_AI_PER_MINUTE", 20),
            },
            property_link_max_depth: count(
                "PROPERTY_LINK_MAX_DEPTH",
                escalation::DEFAULT_MAX_DEPTH,
            ),
            cors_allowed_origins: list("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
            wait_node: WaitNodeConfig {
                process_library_type: number(
                    "WAIT_NODE_PROCESS_LIBRARY_TYPE",
                    wait_node::PROCESS_LIBRARY_TYPE,
                ),
                max_depth: count("WAIT_NODE_MAX_DEPTH", wait_node::DEFAULT_MAX_DEPTH),
                verify_delay: Duration::from_millis(number("WAIT_NODE_VERIFY_DELAY_MS", 1000)),
            },
        }
    }
}

impl ClickUpConfig {
    /// Retry policy with the configured attempt budget.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries.max(1),
            ..RetryPolicy::default()
        }
    }
}
