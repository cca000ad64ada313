//! Response sink abstraction for decoupling the turn from presentation.
//!
//! The session emits events through [`ResponseSink`] without knowing whether
//! they end up on a terminal, in a buffer, or somewhere else.

use std::io;

/// Events emitted while a turn runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvent<'a> {
    /// A chunk of text from the streaming response, in arrival order.
    TextChunk(&'a str),

    /// A diagnostic message for the user.
    Diagnostic {
        message: String,
        /// If true, only show when verbose mode is enabled.
        verbose_only: bool,
    },

    /// The response stream has stopped (successfully or not).
    Finished,
}

/// Trait for handling response events during a turn.
///
/// # Example
///
/// ```
/// use ai_core::api::sink::{ResponseEvent, ResponseSink};
/// use std::io;
///
/// struct Upper(String);
///
/// impl ResponseSink for Upper {
///     fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()> {
///         if let ResponseEvent::TextChunk(chunk) = event {
///             self.0.push_str(&chunk.to_uppercase());
///         }
///         Ok(())
///     }
/// }
///
/// let mut sink = Upper(String::new());
/// sink.handle(ResponseEvent::TextChunk("hi")).unwrap();
/// assert_eq!(sink.0, "HI");
/// ```
pub trait ResponseSink {
    /// Handle a response event. Text chunks must be forwarded without
    /// waiting for the rest of the answer.
    fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()>;
}

/// A sink that collects everything for programmatic use and tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Accumulated text content from the response.
    pub text: String,
    /// Text chunks exactly as delivered.
    pub chunks: Vec<String>,
    /// Diagnostic messages emitted.
    pub diagnostics: Vec<String>,
    /// Whether `Finished` was seen.
    pub finished: bool,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseSink for CollectingSink {
    fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()> {
        match event {
            ResponseEvent::TextChunk(chunk) => {
                self.text.push_str(chunk);
                self.chunks.push(chunk.to_string());
            }
            ResponseEvent::Diagnostic { message, .. } => {
                self.diagnostics.push(message);
            }
            ResponseEvent::Finished => {
                self.finished = true;
            }
        }
        Ok(())
    }
}
