//! Provider selection
//!
//! The provider trait uses `async fn`, so it cannot be boxed; the CLI picks
//! one concrete provider at startup and wraps it in [`AnyProvider`].

use clap::ValueEnum;
use quill_error::{Error, Result};
use quill_llm::{
    CompletionRequest, CompletionResponse, GeminiProvider, LlmProvider, OpenAIProvider,
    ProviderConfig, ProviderError, ProviderType,
};

/// Base URL used for `--provider local` when none is given (Ollama's OpenAI endpoint)
pub const DEFAULT_LOCAL_URL: &str = "http://localhost:11434/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// Google Gemini (needs GEMINI_API_KEY)
    Gemini,
    /// OpenAI (needs OPENAI_API_KEY)
    Openai,
    /// Any OpenAI-compatible server, no key
    Local,
}

impl ProviderKind {
    pub fn provider_type(self) -> ProviderType {
        match self {
            ProviderKind::Gemini => ProviderType::Gemini,
            ProviderKind::Openai => ProviderType::OpenAI,
            ProviderKind::Local => ProviderType::Local,
        }
    }
}

/// Connection settings gathered from flags and the environment
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

impl ProviderSettings {
    /// `--api-key` if given, else the provider's own environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| {
                self.kind
                    .provider_type()
                    .api_key_env()
                    .and_then(|var| std::env::var(var).ok())
            })
            .filter(|key| !key.trim().is_empty())
    }

    /// Build the provider configuration around an already resolved key
    pub fn provider_config(&self, api_key: Option<String>) -> Result<ProviderConfig> {
        let config = match self.kind {
            ProviderKind::Gemini => ProviderConfig::gemini(api_key.unwrap_or_default()),
            ProviderKind::Openai => ProviderConfig::openai(api_key.unwrap_or_default()),
            ProviderKind::Local => {
                let model = self.model.clone().ok_or_else(|| {
                    Error::config_invalid("the local provider needs --model")
                        .with_operation("cli::provider_config")
                })?;
                ProviderConfig::local(DEFAULT_LOCAL_URL, model)
            }
        };

        let config = match &self.base_url {
            Some(url) => config.with_base_url(url.clone()),
            None => config,
        };
        let config = match &self.model {
            Some(model) => config.with_model(model.clone()),
            None => config,
        };
        Ok(config.with_timeout(self.timeout_secs))
    }
}

/// The provider chosen on the command line
pub enum AnyProvider {
    Gemini(GeminiProvider),
    OpenAI(OpenAIProvider),
}

impl AnyProvider {
    /// Resolve the key and construct the provider.
    ///
    /// A missing key is reported here, before any model call.
    pub fn connect(settings: &ProviderSettings) -> Result<Self> {
        Self::from_config(settings.provider_config(settings.resolve_api_key())?)
    }

    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        let provider = match config.provider_type {
            ProviderType::Gemini => AnyProvider::Gemini(GeminiProvider::new(config)?),
            ProviderType::OpenAI | ProviderType::Local => {
                AnyProvider::OpenAI(OpenAIProvider::new(config)?)
            }
        };
        tracing::debug!(
            provider = provider.name(),
            default_model = provider.default_model(),
            "provider ready"
        );
        Ok(provider)
    }
}

impl LlmProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            AnyProvider::Gemini(p) => p.name(),
            AnyProvider::OpenAI(p) => p.name(),
        }
    }

    fn models(&self) -> Vec<String> {
        match self {
            AnyProvider::Gemini(p) => p.models(),
            AnyProvider::OpenAI(p) => p.models(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            AnyProvider::Gemini(p) => p.default_model(),
            AnyProvider::OpenAI(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
        match self {
            AnyProvider::Gemini(p) => p.complete(request).await,
            AnyProvider::OpenAI(p) => p.complete(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_error::ErrorKind;

    fn settings(kind: ProviderKind) -> ProviderSettings {
        ProviderSettings {
            kind,
            api_key: None,
            base_url: None,
            model: None,
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_gemini_without_key_fails_fast() {
        let config = settings(ProviderKind::Gemini).provider_config(None).unwrap();
        let err = AnyProvider::from_config(config).err().unwrap();

        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("env"), Some("GEMINI_API_KEY"));
    }

    #[test]
    fn test_gemini_with_key() {
        let config = settings(ProviderKind::Gemini)
            .provider_config(Some("key".into()))
            .unwrap();
        assert_eq!(config.timeout_secs, 30);

        let provider = AnyProvider::from_config(config).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.default_model(), "gemini-3-flash");
        assert!(provider.supports_model("gemini-2.5-flash-lite"));
    }

    #[test]
    fn test_flag_key_wins_over_environment() {
        let mut s = settings(ProviderKind::Gemini);
        s.api_key = Some("from-flag".into());
        assert_eq!(s.resolve_api_key().as_deref(), Some("from-flag"));

        s.api_key = Some("   ".into());
        s.kind = ProviderKind::Local;
        assert_eq!(s.resolve_api_key(), None);
    }

    #[test]
    fn test_model_and_base_url_overrides() {
        let mut s = settings(ProviderKind::Openai);
        s.model = Some("gpt-4o-mini".into());
        s.base_url = Some("http://proxy.internal/v1".into());

        let config = s.provider_config(Some("sk-test".into())).unwrap();
        assert_eq!(config.default_model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.base_url.as_deref(), Some("http://proxy.internal/v1"));

        let provider = AnyProvider::from_config(config).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_local_needs_model() {
        let err = settings(ProviderKind::Local).provider_config(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let mut s = settings(ProviderKind::Local);
        s.model = Some("llama3".into());
        let provider = AnyProvider::connect(&s).unwrap();
        assert_eq!(provider.name(), "local");
        assert_eq!(provider.models(), vec!["llama3".to_string()]);
    }
}
