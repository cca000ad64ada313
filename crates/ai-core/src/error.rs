//! Failure taxonomy for a single turn.
//!
//! Configuration problems, malformed stream lines, and unreadable context
//! files are recovered where they happen and only logged. Everything that
//! aborts a turn is a [`TurnError`].

use std::io;
use thiserror::Error;

/// Broad category of a [`TurnError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection failure, non-success status, or a body cut short.
    Transport,
    /// The backend reported an error inside the stream.
    Api,
    /// The new context could not be persisted.
    Persistence,
    /// Writing the answer to the caller failed.
    Output,
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("failed to reach {url}: {message}")]
    Transport { url: String, message: String },

    #[error("API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("response stream ended before completion")]
    Truncated,

    #[error("API error: {0}")]
    Api(String),

    #[error("failed to save context: {0}")]
    Persistence(#[source] io::Error),

    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

impl TurnError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TurnError::Transport { .. } | TurnError::Status { .. } | TurnError::Truncated => {
                ErrorKind::Transport
            }
            TurnError::Api(_) => ErrorKind::Api,
            TurnError::Persistence(_) => ErrorKind::Persistence,
            TurnError::Output(_) => ErrorKind::Output,
        }
    }
}
