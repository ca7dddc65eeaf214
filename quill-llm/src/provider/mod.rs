//! # LLM Provider Interface
//!
//! A trait-based abstraction for communicating with hosted LLM backends.
//!
//! ## Design
//! - `LlmProvider` trait defines the core interface
//! - Implementations for Gemini, OpenAI-compatible servers, and a scripted stub
//! - One request, one complete response: no streaming, no retries
//! - `generate` is the validated single-prompt entry point used by the front-ends

pub mod gemini;
pub mod openai;
pub mod scripted;

pub use gemini::{GeminiProvider, GEMINI_MODELS};
pub use openai::OpenAIProvider;
pub use scripted::ScriptedProvider;

use crate::config::GenerationConfig;
use crate::error::{self, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Core Types
// ============================================================================

/// A chat message sent to the model.
///
/// Requests are single-turn: at most one system message and one user message.
/// Earlier turns are never replayed, so there is no assistant role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Concatenated system messages, if any
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System && !m.content.trim().is_empty())
            .map(|m| m.content.as_str())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Content of the last user message, if any
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub model: String,
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Errors
// ============================================================================

/// Error type for provider operations
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error, including transport timeouts
    Network(String),
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited or out of quota
    RateLimited { retry_after: Option<u64> },
    /// Authentication failed
    AuthenticationFailed(String),
    /// The prompt was refused before generation
    Blocked(String),
    /// The model answered without any text
    EmptyResponse,
    /// Other error
    Other(String),
}

impl ProviderError {
    /// Whether the same request could succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::AuthenticationFailed(e) => write!(f, "Authentication failed: {}", e),
            Self::Blocked(reason) => write!(f, "Prompt blocked: {}", reason),
            Self::EmptyResponse => write!(f, "Model returned no text"),
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Pull a human-readable message out of an error body.
///
/// Gemini and OpenAI both answer `{"error": {"message": ...}}`; anything else
/// is returned trimmed as-is.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Map a non-success HTTP status plus body into a provider error
pub(crate) fn status_error(status: u16, retry_after: Option<u64>, body: &str) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited { retry_after },
        401 | 403 => ProviderError::AuthenticationFailed(error_message(body)),
        _ => ProviderError::Api {
            status,
            message: error_message(body),
        },
    }
}

pub(crate) fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

pub(crate) fn build_client(config: &ProviderConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| {
            Error::config_invalid(format!("failed to create HTTP client: {}", e))
                .with_operation("provider::build_client")
                .set_source(e)
        })
}

// ============================================================================
// Provider Trait
// ============================================================================

/// The main LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "gemini", "openai")
    fn name(&self) -> &str;

    /// Get available models
    fn models(&self) -> Vec<String>;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Whether `model` can be requested from this provider
    fn supports_model(&self, model: &str) -> bool {
        model == self.default_model() || self.models().iter().any(|m| m == model)
    }

    /// Send a completion request and get a full response
    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError>;

    /// Generate text for a single prompt.
    ///
    /// Rejects an empty prompt and an unsupported model before any network
    /// traffic. Exactly one `complete` call is made; any failure comes back as
    /// a `GenerationFailed` error carrying the provider's message.
    async fn generate(&self, config: &GenerationConfig, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(Error::invalid_argument("prompt must not be empty")
                .with_operation("provider::generate"));
        }
        if !self.supports_model(config.model()) {
            return Err(Error::unsupported_model(config.model(), self.name())
                .with_operation("provider::generate"));
        }

        let mut messages = Vec::with_capacity(2);
        if !config.system_instruction().trim().is_empty() {
            messages.push(ChatMessage::system(config.system_instruction()));
        }
        messages.push(ChatMessage::user(prompt));

        let request = CompletionRequest::new(messages)
            .with_model(config.model())
            .with_temperature(config.temperature());

        tracing::debug!(
            provider = self.name(),
            model = config.model(),
            temperature = config.temperature(),
            prompt_chars = prompt.chars().count(),
            "sending generation request"
        );

        let response = self.complete(request).await.map_err(|e| {
            error::generation_failed(e, self.name(), config.model())
                .with_operation("provider::generate")
        })?;

        match response.content {
            Some(text) if !text.trim().is_empty() => {
                tracing::debug!(
                    provider = self.name(),
                    model = %response.model,
                    finish_reason = ?response.finish_reason,
                    completion_tokens = response.usage.completion_tokens,
                    "generation complete"
                );
                Ok(text)
            }
            _ => Err(error::generation_failed(
                ProviderError::EmptyResponse,
                self.name(),
                config.model(),
            )
            .with_operation("provider::generate")
            .with_context("finish_reason", format!("{:?}", response.finish_reason))),
        }
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Gemini,
    OpenAI,
    Local,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini",
            ProviderType::OpenAI => "openai",
            ProviderType::Local => "local",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Local => None,
        }
    }
}

/// Default transport timeout, the only timeout in the system
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

impl ProviderConfig {
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Gemini,
            api_key: Some(api_key.into()),
            base_url: Some(gemini::DEFAULT_BASE_URL.into()),
            default_model: Some(crate::config::DEFAULT_MODEL.into()),
            headers: HashMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            api_key: Some(api_key.into()),
            base_url: Some(openai::DEFAULT_BASE_URL.into()),
            default_model: Some("gpt-4o".into()),
            headers: HashMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// An OpenAI-compatible server that needs no key (vLLM, Ollama, ...)
    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Local,
            api_key: None,
            base_url: Some(base_url.into()),
            default_model: Some(model.into()),
            headers: HashMap::new(),
            timeout_secs: 300,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// The configured API key, if it is present and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

// ============================================================================
// Tests
// ============================================================================
