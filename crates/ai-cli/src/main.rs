mod cli;
mod output;
mod sink;

use ai_core::{Session, StatePaths, TurnError};
use cli::{Cli, Invocation};
use output::OutputHandler;
use sink::CliResponseSink;
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use thiserror::Error;

/// Failures that end the process, mapped to exit codes in [`CliError::exit_code`].
#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Turn(#[from] TurnError),

    #[error("{0}")]
    Io(#[from] io::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Turn(_) | CliError::Io(_) => 1,
        }
    }
}

/// Route `log` records to stderr as `[LEVEL] message`.
///
/// `RUST_LOG` wins over the built-in filter.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,ai_core=debug,ai=debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

/// Prompt piped on stdin, if any. A terminal is never read.
fn read_stdin_prompt() -> io::Result<Option<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let text = io::read_to_string(stdin)?;
    let text = text.trim_end_matches(['\r', '\n']);
    if text.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(text.to_string()))
    }
}

async fn run(cli: Cli, output: &OutputHandler) -> Result<(), CliError> {
    let mut invocation: Invocation = cli.to_invocation();
    if invocation.wants_stdin_prompt() {
        invocation.prompt = read_stdin_prompt()?;
    }

    if invocation.prompt.is_none() && !invocation.reset && !invocation.info {
        return Err(CliError::Usage(
            "no prompt given (pass words, pipe text on stdin, or see --help)".to_string(),
        ));
    }

    let session = Session::load(cli.home)?;
    log::debug!("home: {}", session.paths().home().display());

    if invocation.info {
        output.emit_info(&session);
    }

    if invocation.reset {
        session.reset_context()?;
        output.diagnostic_always("[Context reset]");
    }

    let Some(prompt) = invocation.prompt else {
        return Ok(());
    };

    let stdout = io::stdout();
    let mut sink = CliResponseSink::new(output, stdout.lock());
    let outcome = session
        .run_turn(&prompt, &invocation.options, &mut sink)
        .await?;

    match &outcome.commit {
        Some(report) => output.diagnostic(&format!(
            "[{} chars streamed, context {} elements]",
            outcome.streamed_chars, report.after
        )),
        None => output.diagnostic(&format!(
            "[{} chars streamed, context not updated]",
            outcome.streamed_chars
        )),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let cli = match Cli::parse_from_args(&args) {
        Ok(cli) => cli,
        // Prints help/version to stdout (exit 0) or the usage error (exit 2).
        Err(e) => e.exit(),
    };
    init_logging(cli.verbose);
    let output = OutputHandler::new(cli.verbose);

    match run(cli, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}
