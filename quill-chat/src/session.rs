//! # Chat session history
//!
//! A session is an explicitly owned value: the front-end creates one when the
//! user starts talking, mutates it only through `append`, `record_exchange`
//! and `clear`, and drops it when the user leaves. Nothing is written to disk.

use crate::revision::TraceStep;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// One message of the conversation. Fixed once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: TurnRole,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace: Option<Vec<TraceStep>>,
    created_at: u64,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            trace: None,
            created_at: current_timestamp(),
        }
    }

    /// Attach the revision trace that produced this turn
    pub fn with_trace(mut self, trace: Vec<TraceStep>) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn trace(&self) -> Option<&[TraceStep]> {
        self.trace.as_deref()
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}

/// Ordered turns of one interactive session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    id: String,
    created_at: u64,
    turns: Vec<Turn>,
}

impl ChatSession {
    /// Start an empty session with a fresh id
    pub fn new() -> Self {
        Self::with_id(Self::generate_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: current_timestamp(),
            turns: Vec::new(),
        }
    }

    /// Generate a unique session ID
    pub fn generate_id() -> String {
        use std::time::{SystemTime, UNIX_EPOCH};
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        format!("session_{:x}", ts)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Append a completed user/assistant pair in one step
    pub fn record_exchange(&mut self, user: Turn, assistant: Turn) {
        self.turns.reserve(2);
        self.turns.push(user);
        self.turns.push(assistant);
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Forget every turn; the session id stays
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// History as pretty JSON, for `--json` style rendering
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.turns)
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
