//! Completion Client
//!
//! Sends role-tagged chat messages to an OpenAI-compatible chat completions endpoint
//! and returns the generated text. Stateless: no retries and no caching, callers decide
//! how to react to failures.

use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_CLASSIFY_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_POLICY_MODEL: &str = "llama3-70b-8192";

/// How the API key is presented to the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    #[default]
    Bearer,
    /// `x-api-key: <key>`
    ApiKeyHeader,
}

/// Completion endpoint configuration (`[provider]` table)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL; requests go to `{api_url}/chat/completions`
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key. Absent keys are reported when a request is attempted, not at load time.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub auth: AuthScheme,

    /// Model used for per-node classification
    #[serde(default = "default_classify_model")]
    pub classify_model: String,

    /// Model used for policy folds
    #[serde(default = "default_policy_model")]
    pub policy_model: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_classify_model() -> String {
    DEFAULT_CLASSIFY_MODEL.to_string()
}

fn default_policy_model() -> String {
    DEFAULT_POLICY_MODEL.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            auth: AuthScheme::default(),
            classify_model: default_classify_model(),
            policy_model: default_policy_model(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.api_url.is_empty()
            && !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://"))
        {
            return Err(format!(
                "api_url must start with http:// or https:// (got '{}')",
                self.api_url
            ));
        }
        if self.classify_model.trim().is_empty() {
            return Err("classify_model cannot be empty".to_string());
        }
        if self.policy_model.trim().is_empty() {
            return Err("policy_model cannot be empty".to_string());
        }
        Ok(())
    }

    /// True when a non-blank API key is present.
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Completion client trait
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `messages` in order to `model` and return the generated text.
    async fn complete(&self, messages: Vec<ChatMessage>, model: &str) -> Result<String, ApiError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
}

fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

fn map_http_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::ProviderError(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ApiError::ProviderError(format!("Connection error: {}", error))
    } else {
        ApiError::ProviderError(format!("HTTP error: {}", error))
    }
}

fn map_status(status: u16, body: String) -> ApiError {
    match status {
        401 | 403 => ApiError::ProviderAuthFailed(format!("status {}: {}", status, body)),
        429 => ApiError::ProviderRateLimit(body),
        _ => ApiError::ProviderRequestFailed {
            status,
            message: body,
        },
    }
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn build_provider_http_client() -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ApiError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

/// HTTP client for OpenAI-compatible chat completion endpoints
pub struct HttpCompletionClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    auth: AuthScheme,
}

impl HttpCompletionClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        let client = build_provider_http_client()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            auth: config.auth,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_url)
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, messages: Vec<ChatMessage>, model: &str) -> Result<String, ApiError> {
        if self.api_url.is_empty() {
            return Err(ApiError::ProviderNotConfigured(
                "provider.api_url is not set".to_string(),
            ));
        }
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ApiError::ProviderNotConfigured(
                "provider.api_key is not set (use VEIL_API_KEY or the [provider] table)"
                    .to_string(),
            )
        })?;

        let request = ChatCompletionRequest {
            model,
            messages: messages
                .into_iter()
                .map(|msg| WireMessage {
                    role: role_to_string(msg.role).to_string(),
                    content: msg.content,
                })
                .collect(),
        };

        let builder = self.client.post(self.endpoint()).json(&request);
        let builder = match self.auth {
            AuthScheme::Bearer => builder.bearer_auth(api_key),
            AuthScheme::ApiKeyHeader => builder.header("x-api-key", api_key),
        };

        let response = builder.send().await.map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status, error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ProviderError(format!("Failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ApiError::ProviderError("No choices in response".to_string()))
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}

/// Scripted client for unit tests: replays responses in order and records requests.
#[cfg(test)]
pub struct ScriptedClient {
    responses: parking_lot::Mutex<std::collections::VecDeque<Result<String, ApiError>>>,
    calls: parking_lot::Mutex<Vec<(Vec<ChatMessage>, String)>>,
}

#[cfg(test)]
impl ScriptedClient {
    pub fn new(responses: Vec<Result<String, ApiError>>) -> Self {
        Self {
            responses: parking_lot::Mutex::new(responses.into()),
            calls: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn replying(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> Vec<(Vec<ChatMessage>, String)> {
        self.calls.lock().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, messages: Vec<ChatMessage>, model: &str) -> Result<String, ApiError> {
        self.calls.lock().push((messages, model.to_string()));
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("FORWARD".to_string()))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}
