//! Chat front-ends: single-turn replies and writer/critic revisions

use crate::config::RevisionConfig;
use crate::revision::{RevisionController, RevisionOutcome};
use crate::session::{ChatSession, Turn};
use quill_error::Result;
use quill_llm::{GenerationConfig, LlmProvider};

/// What the user gets back for one submission
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Revised(RevisionOutcome),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Text(text) => text,
            Reply::Revised(outcome) => &outcome.draft,
        }
    }
}

/// Anything the interactive loop can talk to
#[allow(async_fn_in_trait)]
pub trait ChatFrontEnd {
    /// Short description for banners, e.g. "gemini/gemini-3-flash"
    fn describe(&self) -> String;

    /// Answer `input` and record the exchange in `session`.
    ///
    /// On error the session is left exactly as it was.
    async fn respond(&self, session: &mut ChatSession, input: &str) -> Result<Reply>;
}

/// Sends each prompt on its own, without earlier turns
pub struct SingleTurnChat<P> {
    provider: P,
    config: GenerationConfig,
}

impl<P: LlmProvider> SingleTurnChat<P> {
    pub fn new(provider: P, config: GenerationConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

impl<P: LlmProvider> ChatFrontEnd for SingleTurnChat<P> {
    fn describe(&self) -> String {
        format!(
            "{}/{} (temperature {:.1})",
            self.provider.name(),
            self.config.model(),
            self.config.temperature()
        )
    }

    async fn respond(&self, session: &mut ChatSession, input: &str) -> Result<Reply> {
        let text = self
            .provider
            .generate(&self.config, input)
            .await
            .map_err(|e| e.with_operation("chat::respond"))?;

        session.record_exchange(Turn::user(input), Turn::assistant(text.clone()));
        tracing::debug!(session = session.id(), turns = session.len(), "recorded exchange");

        Ok(Reply::Text(text))
    }
}

/// Runs the writer/critic loop for each task
pub struct RevisionChat<P> {
    provider: P,
    controller: RevisionController,
}

impl<P: LlmProvider> RevisionChat<P> {
    /// Fails with a configuration error if `config` cannot be run
    pub fn new(provider: P, config: RevisionConfig) -> Result<Self> {
        let controller = RevisionController::new(config)?;
        Ok(Self { provider, controller })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &RevisionConfig {
        self.controller.config()
    }
}

impl<P: LlmProvider> ChatFrontEnd for RevisionChat<P> {
    fn describe(&self) -> String {
        let config = self.controller.config();
        format!(
            "{}/{} (writer/critic, up to {} revisions)",
            self.provider.name(),
            config.generation().model(),
            config.max_revisions()
        )
    }

    async fn respond(&self, session: &mut ChatSession, input: &str) -> Result<Reply> {
        let outcome = self.controller.run(&self.provider, input).await?;

        session.record_exchange(
            Turn::user(input),
            Turn::assistant(outcome.draft.clone()).with_trace(outcome.trace.clone()),
        );
        tracing::debug!(session = session.id(), turns = session.len(), "recorded exchange");

        Ok(Reply::Revised(outcome))
    }
}
