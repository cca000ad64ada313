//! Output handling for the CLI.
//!
//! Answer text goes to stdout through [`crate::sink::CliResponseSink`];
//! everything else (diagnostics, errors, `--info`) goes through
//! [`OutputHandler`] so stdout stays clean for piping.

use ai_core::{Session, StatePaths};

/// CLI output handler: diagnostics and errors to stderr, reports to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Print a diagnostic only when verbose mode is enabled.
    pub fn diagnostic(&self, message: &str) {
        if self.verbose {
            eprintln!("{}", message);
        }
    }

    /// Print a diagnostic regardless of verbose mode.
    pub fn diagnostic_always(&self, message: &str) {
        eprintln!("{}", message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("[ERROR] {}", message);
    }

    /// Print the `--info` report to stdout.
    pub fn emit_info(&self, session: &Session) {
        println!("{}", info_report(session));
    }
}

/// Effective settings, file locations, and the stored context length.
pub fn info_report(session: &Session) -> String {
    let settings = session.settings();
    let paths = session.paths();
    let context_len = session.store().load().len();

    let mut lines = vec![
        format!("model:            {}", settings.model),
        format!("api url:          {}", settings.api_url),
        format!("max context size: {}", settings.max_context_size),
        format!("context length:   {}", context_len),
        format!("home:             {}", paths.home().display()),
    ];
    for (label, path) in [
        ("settings file:    ", paths.settings_file()),
        ("context file:     ", paths.context_file()),
        ("notes file:       ", paths.notes_file()),
        ("system prompt:    ", paths.system_prompt_file()),
    ] {
        let marker = if path.exists() { "" } else { " (missing)" };
        lines.push(format!("{}{}{}", label, path.display(), marker));
    }
    lines.join("\n")
}
