//! Writer/critic revision loop.
//!
//! The loop is a three-state machine:
//!
//! ```text
//!            ┌──────────────── not approved, budget left ───────────────┐
//!            ▼                                                           │
//!   ──▶  Draft ──(writer output, revision_count += 1)──▶ Critique ──────┤
//!                                                                        │
//!                          approved OR revision_count >= max ──▶ Done ◀─┘
//! ```
//!
//! [`prompt_for`] and [`transition`] are pure; [`RevisionController::run`]
//! only performs the model call between them. Since every Draft step adds
//! one to `revision_count` and the budget is at least one, the loop ends
//! after at most `max_revisions` Draft/Critique cycles.

use crate::config::RevisionConfig;
use quill_error::{Error, Result};
use quill_llm::{GenerationConfig, LlmProvider};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Draft,
    Critique,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Draft => "draft",
            Phase::Critique => "critique",
            Phase::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Draft,
    Critique,
}

/// One labeled entry of the revision trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub kind: StepKind,
    /// Revision the step belongs to, starting at 1
    pub revision: u32,
    pub text: String,
}

impl TraceStep {
    pub fn label(&self) -> String {
        match self.kind {
            StepKind::Draft => format!("Writer (v{})", self.revision),
            StepKind::Critique => format!("Critic (v{})", self.revision),
        }
    }
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.text)
    }
}

/// Data carried through one revision run
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionState {
    pub task: String,
    pub draft: String,
    pub critique: String,
    pub revision_count: u32,
    pub trace: Vec<TraceStep>,
    pub writer_persona: String,
    pub critic_persona: String,
}

impl RevisionState {
    pub fn new(task: impl Into<String>, config: &RevisionConfig) -> Self {
        Self {
            task: task.into(),
            draft: String::new(),
            critique: String::new(),
            revision_count: 0,
            trace: Vec::new(),
            writer_persona: config.writer_persona().to_string(),
            critic_persona: config.critic_persona().to_string(),
        }
    }
}

/// Whether a critique accepts the draft
pub fn is_approved(critique: &str, approval_token: &str) -> bool {
    !approval_token.is_empty() && critique.contains(approval_token)
}

/// The prompt the model must answer in `phase`, or `None` once done.
pub fn prompt_for(phase: Phase, state: &RevisionState, config: &RevisionConfig) -> Option<String> {
    match phase {
        Phase::Draft if state.revision_count == 0 => Some(format!(
            "{persona}\n\n\
             Task:\n{task}\n\n\
             Write your response to the task.",
            persona = state.writer_persona,
            task = state.task,
        )),
        Phase::Draft => Some(format!(
            "{persona}\n\n\
             Task:\n{task}\n\n\
             Your previous draft:\n{draft}\n\n\
             Reviewer feedback:\n{critique}\n\n\
             Rewrite the draft so that it addresses the feedback. Reply with the revised text only.",
            persona = state.writer_persona,
            task = state.task,
            draft = state.draft,
            critique = state.critique,
        )),
        Phase::Critique => Some(format!(
            "{persona}\n\n\
             Review the draft below.\n\
             If it is satisfactory and at least {min} characters long, reply with exactly {token}.\n\
             Otherwise reply with a short correction directive of no more than 20 characters.\n\n\
             Draft:\n{draft}",
            persona = state.critic_persona,
            min = config.min_draft_chars(),
            token = config.approval_token(),
            draft = state.draft,
        )),
        Phase::Done => None,
    }
}

/// Generation settings for the call made in `phase`.
///
/// The persona of whoever speaks in that phase replaces the configured system
/// instruction; model and temperature are shared by both roles.
pub fn generation_for(phase: Phase, state: &RevisionState, config: &RevisionConfig) -> GenerationConfig {
    let persona = match phase {
        Phase::Critique => &state.critic_persona,
        Phase::Draft | Phase::Done => &state.writer_persona,
    };
    config
        .generation()
        .clone()
        .with_system_instruction(persona.as_str())
}

/// Fold one model output into the state and pick the next phase.
///
/// Draft output becomes the new draft and bumps `revision_count`; critique
/// output never does. After a critique the approval token is checked first
/// and the budget second, so an unapproved draft still ends the loop once
/// the budget is spent.
pub fn transition(
    phase: Phase,
    mut state: RevisionState,
    output: String,
    config: &RevisionConfig,
) -> (Phase, RevisionState) {
    match phase {
        Phase::Draft => {
            state.revision_count += 1;
            state.trace.push(TraceStep {
                kind: StepKind::Draft,
                revision: state.revision_count,
                text: output.clone(),
            });
            state.draft = output;
            (Phase::Critique, state)
        }
        Phase::Critique => {
            state.trace.push(TraceStep {
                kind: StepKind::Critique,
                revision: state.revision_count,
                text: output.clone(),
            });
            state.critique = output;

            let next = if is_approved(&state.critique, config.approval_token())
                || state.revision_count >= config.max_revisions()
            {
                Phase::Done
            } else {
                Phase::Draft
            };
            (next, state)
        }
        Phase::Done => (Phase::Done, state),
    }
}

/// What a finished run hands back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionOutcome {
    pub draft: String,
    pub trace: Vec<TraceStep>,
    pub revision_count: u32,
    /// Whether the last critique carried the approval token
    pub approved: bool,
}

/// Drives the revision loop against a provider
#[derive(Debug, Clone)]
pub struct RevisionController {
    config: RevisionConfig,
}

impl RevisionController {
    /// Create a controller; the configuration is validated here
    pub fn new(config: RevisionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RevisionConfig {
        &self.config
    }

    /// Run the loop for `task` until the critic approves or the budget runs out.
    ///
    /// Model calls happen strictly one after another. The first failing call
    /// aborts the run and its error is returned; the partial trace is dropped.
    pub async fn run<P: LlmProvider>(&self, provider: &P, task: &str) -> Result<RevisionOutcome> {
        if task.trim().is_empty() {
            return Err(Error::invalid_argument("task must not be empty")
                .with_operation("revision::run"));
        }

        let mut phase = Phase::Draft;
        let mut state = RevisionState::new(task, &self.config);

        while let Some(prompt) = prompt_for(phase, &state, &self.config) {
            let generation = generation_for(phase, &state, &self.config);
            let output = provider
                .generate(&generation, &prompt)
                .await
                .map_err(|e| {
                    e.with_operation("revision::run")
                        .with_context("phase", phase.as_str())
                        .with_context("revision", state.revision_count.to_string())
                })?;

            let (next, updated) = transition(phase, state, output, &self.config);
            tracing::info!(
                from = phase.as_str(),
                to = next.as_str(),
                revision = updated.revision_count,
                max_revisions = self.config.max_revisions(),
                "revision step"
            );
            phase = next;
            state = updated;
        }

        let approved = is_approved(&state.critique, self.config.approval_token());
        tracing::debug!(
            revisions = state.revision_count,
            approved,
            trace_len = state.trace.len(),
            "revision loop finished"
        );

        Ok(RevisionOutcome {
            draft: state.draft,
            trace: state.trace,
            revision_count: state.revision_count,
            approved,
        })
    }
}
