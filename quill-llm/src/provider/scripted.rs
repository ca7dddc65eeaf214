//! Scripted provider - replays canned replies instead of calling a model
//!
//! Stands in for a real model wherever the exact text matters: tests of the
//! revision loop, and offline dry runs. Every request is recorded so callers
//! can assert on how many calls were made and what they carried.

use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;

enum Scripted {
    Reply(String),
    Fail(ProviderError),
}

/// Provider that answers from a script
pub struct ScriptedProvider {
    models: Vec<String>,
    script: Mutex<VecDeque<Scripted>>,
    fallback: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    /// Empty script serving the Gemini model list
    pub fn new() -> Self {
        Self {
            models: GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script that answers each call with the next reply, in order
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        replies.into_iter().fold(Self::new(), |p, r| p.reply(r))
    }

    /// Queue a reply
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Scripted::Reply(text.into()));
        self
    }

    /// Queue a failure
    pub fn fail(self, err: ProviderError) -> Self {
        self.push(Scripted::Fail(err));
        self
    }

    /// Answer with `text` once the script runs out
    pub fn repeat(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    /// Replace the advertised model list
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    /// All requests seen so far, oldest first
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    /// Number of `complete` calls made so far
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Number of scripted entries not yet consumed
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }

    fn push(&self, entry: Scripted) {
        lock(&self.script).push_back(entry);
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

// A panic while holding the lock leaves plain data behind; keep using it.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn models(&self) -> Vec<String> {
        self.models.clone()
    }

    fn default_model(&self) -> &str {
        self.models
            .first()
            .map(|m| m.as_str())
            .unwrap_or(crate::config::DEFAULT_MODEL)
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());
        lock(&self.requests).push(request);

        let next = lock(&self.script).pop_front();
        let text = match next {
            Some(Scripted::Reply(text)) => text,
            Some(Scripted::Fail(err)) => return Err(err),
            None => match &self.fallback {
                Some(text) => text.clone(),
                None => return Err(ProviderError::Other("script exhausted".into())),
            },
        };

        Ok(CompletionResponse {
            model,
            content: Some(text),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        })
    }
}
