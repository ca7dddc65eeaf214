//! Revision loop configuration

use quill_error::{Error, Result};
use quill_llm::GenerationConfig;

/// Literal the critic answers with when it accepts a draft
pub const APPROVAL_TOKEN: &str = "PASS";

/// Shortest draft the critic is told to accept
pub const MIN_DRAFT_CHARS: usize = 50;

pub const DEFAULT_MAX_REVISIONS: u32 = 3;

/// Largest revision budget a caller may ask for
pub const MAX_REVISIONS_LIMIT: u32 = 5;

pub const DEFAULT_WRITER_PERSONA: &str =
    "You are a professional writer. Produce clear, accurate, well-structured text that fully answers the task.";

pub const DEFAULT_CRITIC_PERSONA: &str =
    "You are a strict editor. Judge drafts for accuracy, completeness and clarity.";

/// Everything one revision run needs, fixed for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionConfig {
    generation: GenerationConfig,
    writer_persona: String,
    critic_persona: String,
    max_revisions: u32,
    approval_token: String,
    min_draft_chars: usize,
}

impl RevisionConfig {
    pub fn new(generation: GenerationConfig) -> Self {
        Self {
            generation,
            writer_persona: DEFAULT_WRITER_PERSONA.to_string(),
            critic_persona: DEFAULT_CRITIC_PERSONA.to_string(),
            max_revisions: DEFAULT_MAX_REVISIONS,
            approval_token: APPROVAL_TOKEN.to_string(),
            min_draft_chars: MIN_DRAFT_CHARS,
        }
    }

    pub fn with_writer_persona(mut self, persona: impl Into<String>) -> Self {
        self.writer_persona = persona.into();
        self
    }

    pub fn with_critic_persona(mut self, persona: impl Into<String>) -> Self {
        self.critic_persona = persona.into();
        self
    }

    /// Set the revision budget; checked by [`RevisionConfig::validate`]
    pub fn with_max_revisions(mut self, max_revisions: u32) -> Self {
        self.max_revisions = max_revisions;
        self
    }

    pub fn with_approval_token(mut self, token: impl Into<String>) -> Self {
        self.approval_token = token.into();
        self
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    pub fn writer_persona(&self) -> &str {
        &self.writer_persona
    }

    pub fn critic_persona(&self) -> &str {
        &self.critic_persona
    }

    pub fn max_revisions(&self) -> u32 {
        self.max_revisions
    }

    pub fn approval_token(&self) -> &str {
        &self.approval_token
    }

    pub fn min_draft_chars(&self) -> usize {
        self.min_draft_chars
    }

    /// Reject a configuration the loop cannot run with.
    ///
    /// The budget must lie in `1..=5` so the loop always ends, and the
    /// approval token must be non-empty since every string contains "".
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_REVISIONS_LIMIT).contains(&self.max_revisions) {
            return Err(Error::config_invalid(format!(
                "max revisions must be between 1 and {}, got {}",
                MAX_REVISIONS_LIMIT, self.max_revisions
            ))
            .with_operation("revision::validate")
            .with_context("max_revisions", self.max_revisions.to_string()));
        }
        if self.approval_token.trim().is_empty() {
            return Err(Error::config_invalid("approval token must not be empty")
                .with_operation("revision::validate"));
        }
        Ok(())
    }
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self::new(GenerationConfig::default())
    }
}
