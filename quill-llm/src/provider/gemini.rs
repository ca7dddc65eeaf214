//! Gemini provider implementation
//!
//! Speaks the `models/{model}:generateContent` REST call of the Gemini API.
//! System messages travel as `systemInstruction`; the prompt is the single
//! `user` entry of `contents`.

use super::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models offered by the Gemini provider
pub const GEMINI_MODELS: &[&str] = &["gemini-3-flash", "gemini-2.5-flash-lite", "gemini-2.5-flash"];

/// Gemini API provider
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    /// Create a provider; fails fast when no API key is configured
    pub fn new(config: ProviderConfig) -> Result<Self> {
        if config.api_key().is_none() {
            return Err(Error::missing_credential("GEMINI_API_KEY").with_operation("gemini::new"));
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

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.base_url(), model)
    }

    fn build_request(request: &CompletionRequest) -> GenerateContentRequest {
        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: m.content.clone() }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: request.system_text().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationParams {
                temperature: request.temperature,
            },
        }
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn models(&self) -> Vec<String> {
        GEMINI_MODELS.iter().map(|m| m.to_string()).collect()
    }

    fn default_model(&self) -> &str {
        self.config
            .default_model
            .as_deref()
            .unwrap_or(crate::config::DEFAULT_MODEL)
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());
        let api_request = Self::build_request(&request);

        let mut req = self.client.post(self.endpoint(&model)).json(&api_request);

        if let Some(api_key) = self.config.api_key() {
            req = req.header("x-goog-api-key", api_key);
        }

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        tracing::trace!(model = %model, "POST generateContent");

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

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if let Some(err) = api_response.error {
            return Err(ProviderError::Api {
                status: err.code.unwrap_or(status),
                message: err.message,
            });
        }

        let candidate = match api_response.candidates.into_iter().next() {
            Some(c) => c,
            None => {
                return Err(match api_response.prompt_feedback.and_then(|f| f.block_reason) {
                    Some(reason) => ProviderError::Blocked(reason),
                    None => ProviderError::EmptyResponse,
                })
            }
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") => {
                FinishReason::ContentFilter
            }
            _ => FinishReason::Unknown,
        };

        let usage = api_response
            .usage_metadata
            .map(|u| Usage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            model: api_response.model_version.unwrap_or(model),
            content: if text.is_empty() { None } else { Some(text) },
            finish_reason,
            usage,
        })
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<u16>,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_fails_fast() {
        let err = GeminiProvider::new(ProviderConfig::gemini("")).err().unwrap();
        assert_eq!(err.kind(), quill_error::ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("env"), Some("GEMINI_API_KEY"));
    }

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new(
            ProviderConfig::gemini("k").with_base_url("http://localhost:9000/v1beta/"),
        )
        .unwrap();
        assert_eq!(
            provider.endpoint("gemini-2.5-flash"),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            provider.endpoint("models/gemini-3-flash"),
            "http://localhost:9000/v1beta/models/gemini-3-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("Be terse."),
            ChatMessage::user("Again"),
        ])
        .with_temperature(0.3);

        let body = serde_json::to_value(GeminiProvider::build_request(&request)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be terse.");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Again");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_supported_models() {
        let provider = GeminiProvider::new(ProviderConfig::gemini("k")).unwrap();
        assert!(provider.supports_model("gemini-2.5-flash-lite"));
        assert!(!provider.supports_model("gpt-4o"));
    }
}
