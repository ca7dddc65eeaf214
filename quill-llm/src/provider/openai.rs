//! OpenAI-compatible provider implementation
//!
//! Works with OpenAI, Azure OpenAI, vLLM, Ollama, and other OpenAI-compatible APIs.

use super::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAIProvider {
    /// Create a provider. OpenAI proper needs a key; local servers do not.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        if config.provider_type == ProviderType::OpenAI && config.api_key().is_none() {
            return Err(Error::missing_credential("OPENAI_API_KEY").with_operation("openai::new"));
        }
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }
}

impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        self.config.provider_type.as_str()
    }

    fn models(&self) -> Vec<String> {
        match self.config.provider_type {
            ProviderType::OpenAI => vec![
                "gpt-4o".into(),
                "gpt-4o-mini".into(),
                "gpt-4.1".into(),
                "gpt-4.1-mini".into(),
                "o3-mini".into(),
            ],
            // Local servers serve whatever they were started with
            _ => vec![self.default_model().to_string()],
        }
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or("gpt-4o")
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
        let model = request.model.as_deref().unwrap_or(self.default_model());

        let api_request = OpenAIRequest {
            model: model.to_string(),
            messages: request.messages.iter().map(OpenAIMessage::from).collect(),
            temperature: request.temperature,
            stream: false,
        };

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.base_url()))
            .json(&api_request);

        if let Some(api_key) = self.config.api_key() {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        tracing::trace!(model = %model, "POST chat/completions");

        let response = req
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let retry_after = retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, retry_after, &text));
        }

        let api_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Other("No choices in response".into()))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        };

        let usage = api_response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            model: api_response.model.unwrap_or_else(|| model.to_string()),
            content: choice.message.content,
            finish_reason,
            usage,
        })
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl From<&ChatMessage> for OpenAIMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: match msg.role {
                Role::System => "system".into(),
                Role::User => "user".into(),
            },
            content: Some(msg.content.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: Option<String>,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}
