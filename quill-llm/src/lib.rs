//! # quill-llm
//!
//! Model invocation for quill: one prompt in, one piece of generated text out.
//!
//! ## Core Concepts
//! - **GenerationConfig**: model, temperature and system instruction for a request
//! - **Provider**: trait-based LLM communication (Gemini, OpenAI-compatible, scripted)
//! - **generate**: the single-shot call every front-end goes through; it validates
//!   its inputs, performs exactly one provider call and never retries

pub mod config;
pub mod error;
pub mod provider;

pub use config::{
    clamp_temperature, GenerationConfig, DEFAULT_MODEL, DEFAULT_SYSTEM_INSTRUCTION,
    DEFAULT_TEMPERATURE, MAX_TEMPERATURE, MIN_TEMPERATURE,
};
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, GeminiProvider,
    LlmProvider, OpenAIProvider, ProviderConfig, ProviderError, ProviderType, Role,
    ScriptedProvider, Usage, GEMINI_MODELS,
};
