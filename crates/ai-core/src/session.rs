//! One invocation's turn: compose, request, stream, commit.
//!
//! A turn walks a small state machine:
//!
//! ```text
//! Idle -> Composing -> Requesting -> Streaming -> Committing -> Done
//!                      Streaming -> Done                (done, no context)
//!         Requesting | Streaming | Committing -> Error
//! ```
//!
//! Text is forwarded to the sink as it arrives. The context file is only
//! written in `Committing`, which is reached exclusively from a clean `done`
//! record carrying a context; a failed, errored, or interrupted turn leaves
//! the stored context exactly as it was before the turn.

use crate::api::{
    ResponseEvent, ResponseSink, StreamEvent, build_request, build_request_body,
    send_streaming_request,
};
use crate::context::{CommitReport, ContextStore};
use crate::error::TurnError;
use crate::paths::{AppPaths, StatePaths};
use crate::prompt::{compose, load_text_resource, strip_control_chars};
use crate::settings::Settings;
use reqwest::Client;
use std::io;
use std::path::PathBuf;

/// States of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Composing,
    Requesting,
    Streaming,
    Committing,
    Done,
    Error,
}

impl TurnState {
    pub fn can_transition_to(self, next: TurnState) -> bool {
        use TurnState::*;
        matches!(
            (self, next),
            (Idle, Composing)
                | (Composing, Requesting)
                | (Requesting, Streaming)
                | (Requesting, Error)
                | (Streaming, Committing)
                | (Streaming, Done)
                | (Streaming, Error)
                | (Committing, Done)
                | (Committing, Error)
        )
    }
}

#[derive(Debug)]
struct TurnMachine {
    state: TurnState,
}

impl TurnMachine {
    fn new() -> Self {
        Self {
            state: TurnState::Idle,
        }
    }

    fn advance(&mut self, next: TurnState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal turn transition {:?} -> {:?}",
            self.state,
            next
        );
        log::debug!("turn: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Move to `Error` and hand the error back for propagation.
    fn fail(&mut self, err: TurnError) -> TurnError {
        self.advance(TurnState::Error);
        err
    }
}

/// Per-call overrides from the command line.
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    /// `-m/--model`: model for this call only.
    pub model: Option<String>,
    /// `-s/--system`: system prompt for this call only. Resets prior context.
    pub system: Option<String>,
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Characters of answer text forwarded to the sink.
    pub streamed_chars: usize,
    /// Present when a context was committed.
    pub commit: Option<CommitReport>,
    /// Prior context was cleared because of a system prompt override.
    pub context_reset: bool,
}

/// Session engine for one invocation: resolved paths, settings, and store.
pub struct Session {
    paths: AppPaths,
    settings: Settings,
    store: ContextStore,
    client: Client,
}

impl Session {
    /// Resolve the home directory and load settings once.
    pub fn load(home_override: Option<PathBuf>) -> io::Result<Self> {
        Ok(Self::from_paths(AppPaths::resolve(home_override)?))
    }

    pub fn from_paths(paths: AppPaths) -> Self {
        let settings = Settings::resolve(&paths.settings_file());
        let store = ContextStore::new(paths.context_file());
        Self {
            paths,
            settings,
            store,
            client: Client::new(),
        }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    /// Explicit reset: clears the stored context without any network call.
    pub fn reset_context(&self) -> io::Result<()> {
        self.store.reset()
    }

    /// Run one turn for `prompt`, streaming the answer into `sink`.
    pub async fn run_turn<S: ResponseSink>(
        &self,
        prompt: &str,
        options: &TurnOptions,
        sink: &mut S,
    ) -> Result<TurnOutcome, TurnError> {
        let mut machine = TurnMachine::new();

        let settings = self
            .settings
            .clone()
            .with_model_override(options.model.as_deref());
        let notes = load_text_resource(&self.paths.notes_file());
        let system = match &options.system {
            Some(system) => strip_control_chars(system),
            None => strip_control_chars(&load_text_resource(&self.paths.system_prompt_file())),
        };

        let mut prior = self.store.load();
        let mut context_reset = false;
        if options.system.is_some() && !prior.is_empty() {
            self.store.reset().map_err(TurnError::Persistence)?;
            prior.clear();
            context_reset = true;
            sink.handle(ResponseEvent::Diagnostic {
                message: "[Context reset: system prompt override]".to_string(),
                verbose_only: false,
            })?;
        }

        machine.advance(TurnState::Composing);
        let composed = compose(prompt, &notes);
        let payload = build_request(
            &composed,
            &settings.model,
            Some(system.as_str()),
            Some(prior.as_slice()),
        );

        machine.advance(TurnState::Requesting);
        log::debug!(
            "POST {} (model {}, {} context elements)",
            settings.api_url,
            settings.model,
            prior.len()
        );
        log::trace!("request body: {}", build_request_body(&payload));
        let mut stream = send_streaming_request(&self.client, &settings.api_url, &payload)
            .await
            .map_err(|e| machine.fail(e))?;

        machine.advance(TurnState::Streaming);
        let mut streamed_chars = 0;
        let final_context = loop {
            let event = match stream.next_event().await {
                Some(Ok(event)) => event,
                Some(Err(e)) => return Err(abort(&mut machine, sink, e)),
                None => return Err(abort(&mut machine, sink, TurnError::Truncated)),
            };

            match event {
                StreamEvent::Text(text) => {
                    streamed_chars += text.chars().count();
                    if let Err(e) = sink.handle(ResponseEvent::TextChunk(&text)) {
                        return Err(machine.fail(e.into()));
                    }
                }
                StreamEvent::Warning(message) => log::warn!("{}", message),
                StreamEvent::Failed(message) => {
                    return Err(abort(&mut machine, sink, TurnError::Api(message)));
                }
                StreamEvent::Done { context } => break context,
            }
        };
        sink.handle(ResponseEvent::Finished)
            .map_err(|e| machine.fail(e.into()))?;

        let Some(raw_context) = final_context else {
            log::warn!("response finished without a context; nothing to persist");
            machine.advance(TurnState::Done);
            return Ok(TurnOutcome {
                streamed_chars,
                commit: None,
                context_reset,
            });
        };

        machine.advance(TurnState::Committing);
        let report = self
            .store
            .commit(&raw_context, settings.max_context_size)
            .map_err(|e| machine.fail(TurnError::Persistence(e)))?;

        if report.pruned() {
            sink.handle(ResponseEvent::Diagnostic {
                message: format!(
                    "[Context pruned: {} -> {} elements]",
                    report.before, report.after
                ),
                verbose_only: true,
            })
            .map_err(|e| machine.fail(e.into()))?;
        }

        machine.advance(TurnState::Done);
        Ok(TurnOutcome {
            streamed_chars,
            commit: Some(report),
            context_reset,
        })
    }
}

/// Close out the visible answer, then fail the turn.
fn abort<S: ResponseSink>(machine: &mut TurnMachine, sink: &mut S, err: TurnError) -> TurnError {
    let _ = sink.handle(ResponseEvent::Finished);
    machine.fail(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use TurnState::*;
        let path = [Idle, Composing, Requesting, Streaming, Committing, Done];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?}", pair);
        }
        assert!(Streaming.can_transition_to(Done));
    }

    #[test]
    fn test_error_only_from_io_states() {
        use TurnState::*;
        for state in [Requesting, Streaming, Committing] {
            assert!(state.can_transition_to(Error));
        }
        for state in [Idle, Composing, Done, Error] {
            assert!(!state.can_transition_to(Error));
        }
    }

    #[test]
    fn test_commit_unreachable_without_streaming() {
        use TurnState::*;
        for state in [Idle, Composing, Requesting, Done, Error] {
            assert!(!state.can_transition_to(Committing), "{:?}", state);
        }
    }

    #[test]
    fn test_machine_records_failure() {
        let mut machine = TurnMachine::new();
        machine.advance(TurnState::Composing);
        machine.advance(TurnState::Requesting);
        let err = machine.fail(TurnError::Truncated);
        assert_eq!(machine.state, TurnState::Error);
        assert!(matches!(err, TurnError::Truncated));
    }
}
