//! CLI argument parsing with clap.
//!
//! This module handles parsing command-line arguments and converting them
//! into an [`Invocation`] the main loop can execute.

use ai_core::TurnOptions;
use clap::Parser;
use std::path::PathBuf;

/// ai - chat with a local model from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "ai",
    version,
    about = "Chat with a local model from the terminal, continuing one shared conversation",
    after_help = CLI_AFTER_HELP
)]
pub struct Cli {
    /// Reset the conversation context (no request is sent unless a prompt follows)
    #[arg(short = 'r', long = "reset")]
    pub reset: bool,

    /// Use a different model for this call only
    #[arg(short = 'm', long = "model", value_name = "NAME")]
    pub model: Option<String>,

    /// Use a different system prompt for this call only (resets existing context)
    #[arg(
        short = 's',
        long = "system",
        value_name = "TEXT",
        allow_hyphen_values = true
    )]
    pub system: Option<String>,

    /// Show effective settings, file locations, and context size
    #[arg(short = 'i', long = "info")]
    pub info: bool,

    /// Show verbose diagnostics
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Override the home directory (default: $AI_HOME or ~/.ai)
    #[arg(long = "home", value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// The prompt to send (all remaining arguments)
    /// Note: Use -- before prompts that start with - (e.g., ai -- -starts-with-dash)
    #[arg(trailing_var_arg = true)]
    pub prompt: Vec<String>,
}

const CLI_AFTER_HELP: &str = r#"EXAMPLES:
  ai What is Rust?                 Send a prompt (continues the conversation)
  ai -r                            Forget the conversation
  ai -r Start over: what is 2+2?   Forget, then ask
  ai -m mistral Summarize this     Use another model once
  ai -s "Answer in French" Hello   One-off system prompt (resets context)
  echo "text" | ai                 Read the prompt from stdin
  ai -i                            Show settings and context size

FILES (in $AI_HOME or ~/.ai):
  ai.conf            AI_OLLAMA_MODEL, AI_OLLAMA_API_URL, AI_MAX_CONTEXT_TOKENS
  context.json       Rolling conversation context shared by all terminals
  notes.md           Persistent notes added to every prompt
  system_prompt.md   System prompt sent with every request"#;

/// What one run of the binary should do.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub reset: bool,
    pub info: bool,
    pub prompt: Option<String>,
    pub options: TurnOptions,
}

impl Invocation {
    /// Whether stdin should be consulted for a prompt.
    pub fn wants_stdin_prompt(&self) -> bool {
        self.prompt.is_none() && !self.reset && !self.info
    }
}

impl Cli {
    /// Parse CLI arguments from a slice (testable version)
    pub fn parse_from_args(args: &[String]) -> Result<Self, clap::Error> {
        Self::try_parse_from(args)
    }

    /// Joined prompt words, or `None` when nothing but whitespace was given.
    pub fn prompt_text(&self) -> Option<String> {
        let joined = self.prompt.join(" ");
        if joined.trim().is_empty() {
            None
        } else {
            Some(joined)
        }
    }

    pub fn to_invocation(&self) -> Invocation {
        Invocation {
            reset: self.reset,
            info: self.info,
            prompt: self.prompt_text(),
            options: TurnOptions {
                model: self.model.clone(),
                system: self.system.clone(),
            },
        }
    }
}
