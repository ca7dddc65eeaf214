//! Interactive loop and terminal rendering

use quill_chat::{ChatFrontEnd, ChatSession, Reply, RevisionOutcome, TraceStep, Turn, TurnRole};
use quill_error::{Error, ErrorKind, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Trace entries longer than this are shortened unless `--verbose`
const TRACE_PREVIEW_CHARS: usize = 160;

const HELP: &str = "\
Commands:
  /clear     forget the conversation so far
  /history   show every turn of this session
  /json      dump the session as JSON
  /help      show this help
  /exit      leave (also /quit or Ctrl-D)
Anything else is sent to the model.";

/// How much to print besides the answer
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub verbose: bool,
    pub quiet: bool,
}

/// One line of REPL input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Say(&'a str),
    Clear,
    History,
    Json,
    Help,
    Exit,
    Unknown(&'a str),
    Empty,
}

pub fn parse_line(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if !line.starts_with('/') {
        return Command::Say(line);
    }
    match line {
        "/clear" => Command::Clear,
        "/history" => Command::History,
        "/json" => Command::Json,
        "/help" | "/?" => Command::Help,
        "/exit" | "/quit" => Command::Exit,
        other => Command::Unknown(other),
    }
}

/// Run the read/respond loop until `/exit` or end of input.
///
/// A failed call is reported and the loop goes on with the session as it
/// was before the call.
pub async fn run<F: ChatFrontEnd>(front: &F, session: &mut ChatSession, out: Output) -> Result<()> {
    if !out.quiet {
        println!("quill · {}", front.describe());
        println!("Type /help for commands.\n");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_line(&line) {
            Command::Empty => continue,
            Command::Exit => break,
            Command::Help => println!("{}", HELP),
            Command::Clear => {
                session.clear();
                println!("(history cleared)");
            }
            Command::History => println!("{}", render_history(session)),
            Command::Json => match session.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("{}", render_error(&Error::unexpected(e.to_string()))),
            },
            Command::Unknown(cmd) => println!("Unknown command {}; try /help", cmd),
            Command::Say(input) => match front.respond(session, input).await {
                Ok(reply) => println!("{}\n", render_reply(&reply, out)),
                Err(e) => {
                    tracing::debug!(error = ?e, "call failed");
                    eprintln!("{}\n", render_error(&e));
                }
            },
        }
    }

    tracing::debug!(session = session.id(), turns = session.len(), "session closed");
    Ok(())
}

/// Answer text, preceded by the revision trace unless quiet
pub fn render_reply(reply: &Reply, out: Output) -> String {
    match reply {
        Reply::Text(text) => text.clone(),
        Reply::Revised(outcome) if out.quiet => outcome.draft.clone(),
        Reply::Revised(outcome) => format!(
            "{}\n{}\n\n{}",
            render_trace(&outcome.trace, out.verbose),
            outcome_banner(outcome),
            outcome.draft
        ),
    }
}

fn outcome_banner(outcome: &RevisionOutcome) -> String {
    let plural = if outcome.revision_count == 1 { "" } else { "s" };
    if outcome.approved {
        format!(
            "--- Final answer (approved after {} revision{}) ---",
            outcome.revision_count, plural
        )
    } else {
        format!(
            "--- Final answer (not approved, stopped after {} revision{}) ---",
            outcome.revision_count, plural
        )
    }
}

pub fn render_trace(trace: &[TraceStep], verbose: bool) -> String {
    let mut lines = vec![format!("--- Revision trace ({} steps) ---", trace.len())];
    for step in trace {
        let text = if verbose {
            step.text.clone()
        } else {
            truncate(&step.text, TRACE_PREVIEW_CHARS)
        };
        lines.push(format!("  {}: {}", step.label(), text));
    }
    lines.join("\n")
}

pub fn render_history(session: &ChatSession) -> String {
    if session.is_empty() {
        return "(no turns yet)".to_string();
    }
    session
        .turns()
        .iter()
        .map(render_turn)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_turn(turn: &Turn) -> String {
    let speaker = match turn.role() {
        TurnRole::User => "you",
        TurnRole::Assistant => "assistant",
    };
    match turn.trace() {
        Some(trace) if !trace.is_empty() => format!(
            "{}: {}\n{}",
            speaker,
            turn.content(),
            render_trace(trace, false)
        ),
        _ => format!("{}: {}", speaker, turn.content()),
    }
}

/// User-facing line for a failed command or call
pub fn render_error(err: &Error) -> String {
    match err.kind() {
        ErrorKind::ConfigInvalid => return format!("Configuration error: {}", err.message()),
        ErrorKind::InvalidArgument => return format!("Invalid input: {}", err.message()),
        _ => {}
    }
    let mut line = format!("Call failed: {}", err.message());
    if err.is_retryable() {
        line.push_str(" (temporary, try again)");
    }
    line
}

/// Shorten to at most `max_chars` characters, marking the cut with `…`
pub fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
