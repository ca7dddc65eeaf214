//! # quill-chat
//!
//! The two chat front-ends and the state they own:
//! 1. A session holds the ordered turns of one interactive session
//! 2. Single-turn chat sends each prompt on its own and records the exchange
//! 3. The revision loop alternates a writer draft and a critic review
//! 4. The critic's approval token, or the revision budget, ends the loop
//! 5. Only a completed request touches the session; failures leave it as it was

mod chat;
mod config;
mod revision;
mod session;

pub use chat::{ChatFrontEnd, Reply, RevisionChat, SingleTurnChat};
pub use config::{
    RevisionConfig, APPROVAL_TOKEN, DEFAULT_CRITIC_PERSONA, DEFAULT_MAX_REVISIONS,
    DEFAULT_WRITER_PERSONA, MAX_REVISIONS_LIMIT, MIN_DRAFT_CHARS,
};
pub use revision::{
    generation_for, is_approved, prompt_for, transition, Phase, RevisionController, RevisionOutcome,
    RevisionState, StepKind, TraceStep,
};
pub use session::{ChatSession, Turn, TurnRole};
