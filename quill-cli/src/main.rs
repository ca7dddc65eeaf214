//! # quill CLI
//!
//! Chat with a hosted model, or let a writer and a critic refine the answer.
//!
//! Usage:
//!   quill chat [prompt]
//!   quill revise [--max-revisions N] [task]
//!   quill models
//!
//! Without a prompt or task both `chat` and `revise` start an interactive
//! session. Examples:
//!   quill chat "How do I read a file line by line in Rust?"
//!   quill -t 0.2 revise --max-revisions 2 "Write a product description for a standing desk"
//!   quill --provider local --model llama3 chat
//!
//! Exit codes:
//! - 0: Success
//! - 1: A model call failed
//! - 2: Invalid configuration or input (missing key, unsupported model, bad budget)

mod provider;
mod repl;

use clap::{Parser, Subcommand};
use provider::{AnyProvider, ProviderKind, ProviderSettings};
use quill_chat::{
    ChatFrontEnd, ChatSession, RevisionChat, RevisionConfig, SingleTurnChat, DEFAULT_MAX_REVISIONS,
};
use quill_error::{Error, Result};
use quill_llm::{provider::DEFAULT_TIMEOUT_SECS, GenerationConfig, LlmProvider, DEFAULT_TEMPERATURE};
use repl::Output;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Process exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const CALL_FAILED: u8 = 1;
    pub const INVALID_CONFIG: u8 = 2;
}

#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about = "quill - chat with a hosted model, or let a writer and a critic refine the answer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API key (defaults to GEMINI_API_KEY or OPENAI_API_KEY, by provider)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model provider
    #[arg(long, value_enum, global = true, default_value = "gemini", env = "QUILL_PROVIDER")]
    provider: ProviderKind,

    /// Override the provider's base URL
    #[arg(long, global = true, env = "QUILL_BASE_URL")]
    base_url: Option<String>,

    /// Model to use (defaults to the provider's default)
    #[arg(short, long, global = true, env = "QUILL_MODEL")]
    model: Option<String>,

    /// Sampling temperature, clamped to 0.0-2.0
    #[arg(short, long, global = true, default_value_t = DEFAULT_TEMPERATURE, allow_negative_numbers = true)]
    temperature: f32,

    /// System instruction for `chat` (`revise` sends the writer and critic personas instead)
    #[arg(long, global = true)]
    system: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Debug logging and full revision traces
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only print answers
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question, or chat interactively when none is given
    Chat {
        /// The prompt
        #[arg(trailing_var_arg = true)]
        prompt: Vec<String>,
    },
    /// Draft, critique and revise until approved or out of revisions
    Revise {
        /// Writer persona
        #[arg(long)]
        writer: Option<String>,

        /// Critic persona
        #[arg(long)]
        critic: Option<String>,

        /// Revision budget (1-5)
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_REVISIONS)]
        max_revisions: u32,

        /// The task
        #[arg(trailing_var_arg = true)]
        task: Vec<String>,
    },
    /// List the models the selected provider serves
    Models,
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "warn,quill_llm=debug,quill_chat=debug,quill=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Answers go to stdout; keep logs out of the way
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn exit_code(err: &Error) -> u8 {
    if err.kind().is_pre_call() {
        ExitCodes::INVALID_CONFIG
    } else {
        ExitCodes::CALL_FAILED
    }
}

/// Answer one input and exit, or hand over to the REPL when there is none
async fn drive<F: ChatFrontEnd>(front: &F, words: Vec<String>, out: Output) -> Result<()> {
    let mut session = ChatSession::new();
    let input = words.join(" ");
    if input.trim().is_empty() {
        return repl::run(front, &mut session, out).await;
    }

    if out.verbose {
        eprintln!("quill · {}", front.describe());
    }
    let reply = front.respond(&mut session, &input).await?;
    println!("{}", repl::render_reply(&reply, out));
    Ok(())
}

fn list_models(provider: &AnyProvider, quiet: bool) {
    if !quiet {
        println!("Models served by {}:", provider.name());
    }
    for model in provider.models() {
        if !quiet && model == provider.default_model() {
            println!("  - {} (default)", model);
        } else if quiet {
            println!("{}", model);
        } else {
            println!("  - {}", model);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        command,
        api_key,
        provider,
        base_url,
        model,
        temperature,
        system,
        timeout,
        verbose,
        quiet,
    } = cli;

    let settings = ProviderSettings {
        kind: provider,
        api_key,
        base_url,
        model: model.clone(),
        timeout_secs: timeout,
    };
    let provider = AnyProvider::connect(&settings)?;
    let out = Output { verbose, quiet };

    let generation = GenerationConfig::new(model.as_deref().unwrap_or(provider.default_model()))
        .with_temperature(temperature);
    let generation = match system {
        Some(system) => generation.with_system_instruction(system),
        None => generation,
    };
    tracing::debug!(
        provider = provider.name(),
        model = generation.model(),
        temperature = generation.temperature(),
        "generation settings"
    );

    match command {
        Commands::Models => {
            list_models(&provider, quiet);
            Ok(())
        }
        Commands::Chat { prompt } => {
            let chat = SingleTurnChat::new(provider, generation);
            drive(&chat, prompt, out).await
        }
        Commands::Revise {
            writer,
            critic,
            max_revisions,
            task,
        } => {
            let mut config = RevisionConfig::new(generation).with_max_revisions(max_revisions);
            if let Some(writer) = writer {
                config = config.with_writer_persona(writer);
            }
            if let Some(critic) = critic {
                config = config.with_critic_persona(critic);
            }
            let chat = RevisionChat::new(provider, config)?;
            drive(&chat, task, out).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("{}", repl::render_error(&e));
            ExitCode::from(exit_code(&e))
        }
    }
}
