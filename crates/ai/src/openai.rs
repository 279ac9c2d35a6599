//! OpenAI providers: chat completions and legacy completions.
//!
//! Deployments sit behind proxies and gateways that expose one or both
//! OpenAI calling conventions. [`detect_providers`] checks the endpoint once at
//! startup and orders the providers so the request path never has to guess.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AiError, AiResult};
use crate::provider::{AIMessage, AIProvider, AIResponse, GenerateOptions, TokenUsage};

/// OpenAI API root
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Connection settings shared by both OpenAI providers.
#[derive(Debug, Clone)]
pub struct OpenAISettings {
    /// API key; `None` disables every OpenAI provider.
    pub api_key: Option<String>,
    /// API root, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OPENAI_API_URL.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

impl OpenAISettings {
    fn client(&self) -> AiResult<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AiError::NotConfigured(format!("failed to build HTTP client: {e}")))
    }

    fn api_key(&self) -> AiResult<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AiError::NotConfigured("OPENAI_API_KEY not set".to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

// =========================================================================
// Wire types
// =========================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(clippy::struct_field_names)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// POST a request and decode a completion-shaped response.
async fn post_completion<B: Serialize + Sync>(
    client: &Client,
    url: &str,
    api_key: &str,
    body: &B,
) -> AiResult<CompletionResponse> {
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);
        return Err(AiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&text).map_err(|e| AiError::Decode(e.to_string()))
}

fn into_response(
    api: CompletionResponse,
    requested_model: &str,
    provider: &'static str,
    text: Option<String>,
) -> AiResult<AIResponse> {
    let text = text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(AiError::EmptyResponse)?;
    let usage = api.usage.unwrap_or_default();

    Ok(AIResponse {
        text,
        usage: TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        },
        model: api.model.unwrap_or_else(|| requested_model.to_string()),
        provider: provider.to_string(),
    })
}

// =========================================================================
// Chat completions
// =========================================================================

/// Provider for `POST /chat/completions`.
pub struct OpenAIChatProvider {
    client: Client,
    settings: OpenAISettings,
}

impl OpenAIChatProvider {
    /// Create a chat provider.
    pub fn new(settings: OpenAISettings) -> AiResult<Self> {
        Ok(Self {
            client: settings.client()?,
            settings,
        })
    }
}

#[async_trait]
impl AIProvider for OpenAIChatProvider {
    fn name(&self) -> &'static str {
        "openai-chat"
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> AiResult<AIResponse> {
        let api_key = self.settings.api_key()?;
        let request = ChatRequest {
            model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let mut api = post_completion(
            &self.client,
            &self.settings.url("chat/completions"),
            api_key,
            &request,
        )
        .await?;
        let text = api
            .choices
            .drain(..)
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);
        into_response(api, model, self.name(), text)
    }
}

// =========================================================================
// Legacy completions
// =========================================================================

/// Provider for the older `POST /completions` convention.
///
/// Messages are flattened into a single prompt.
pub struct OpenAILegacyProvider {
    client: Client,
    settings: OpenAISettings,
}

impl OpenAILegacyProvider {
    /// Create a legacy-completions provider.
    pub fn new(settings: OpenAISettings) -> AiResult<Self> {
        Ok(Self {
            client: settings.client()?,
            settings,
        })
    }

    fn flatten(messages: &[AIMessage]) -> String {
        messages
            .iter()
            .map(|m| m.content.trim())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait]
impl AIProvider for OpenAILegacyProvider {
    fn name(&self) -> &'static str {
        "openai-legacy"
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> AiResult<AIResponse> {
        let api_key = self.settings.api_key()?;
        let request = CompletionRequest {
            model,
            prompt: Self::flatten(messages),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let mut api = post_completion(
            &self.client,
            &self.settings.url("completions"),
            api_key,
            &request,
        )
        .await?;
        let text = api.choices.drain(..).next().and_then(|c| c.text);
        into_response(api, model, self.name(), text)
    }
}

// =========================================================================
// Capability check
// =========================================================================

/// Which calling convention the endpoint prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// `GET /models` succeeded; modern API.
    Modern,
    /// `GET /models` is missing; an older gateway.
    Legacy,
    /// Check failed for another reason; assume modern.
    Unknown,
    /// No API key.
    Disabled,
}

/// Check the endpoint and return providers in preference order.
///
/// Both conventions are always returned when a key is configured, so a
/// request can still fall through to the other one.
pub async fn detect_providers(
    settings: &OpenAISettings,
) -> (Detection, Vec<Arc<dyn AIProvider>>) {
    let Ok(api_key) = settings.api_key() else {
        info!("No OPENAI_API_KEY configured - summaries will use the template fallback");
        return (Detection::Disabled, Vec::new());
    };

    let outcome = match settings.client() {
        Ok(client) => match client
            .get(settings.url("models"))
            .bearer_auth(api_key)
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => Detection::Modern,
            Ok(r) if r.status() == StatusCode::NOT_FOUND => Detection::Legacy,
            Ok(r) => {
                warn!(status = %r.status(), "OpenAI capability check returned an error");
                Detection::Unknown
            }
            Err(e) => {
                warn!(error = %e, "OpenAI capability check failed");
                Detection::Unknown
            }
        },
        Err(e) => {
            warn!(error = %e, "OpenAI client unavailable");
            return (Detection::Unknown, Vec::new());
        }
    };

    let chat =
        OpenAIChatProvider::new(settings.clone()).map(|p| Arc::new(p) as Arc<dyn AIProvider>);
    let legacy =
        OpenAILegacyProvider::new(settings.clone()).map(|p| Arc::new(p) as Arc<dyn AIProvider>);

    let ordered = match outcome {
        Detection::Legacy => [legacy, chat],
        _ => [chat, legacy],
    };
    let providers: Vec<_> = ordered.into_iter().filter_map(Result::ok).collect();

    info!(
        ?outcome,
        providers = ?providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
        "OpenAI providers selected"
    );
    (outcome, providers)
}
