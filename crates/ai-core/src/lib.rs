//! ai-core: session/context engine for the `ai` command-line client
//!
//! Resolves settings, composes prompts, streams answers from a local
//! generate endpoint, and maintains the rolling context shared by every
//! invocation.
//!
//! # Quick Start
//!
//! ```no_run
//! use ai_core::{CollectingSink, Session, TurnOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Uses AI_HOME or ~/.ai
//!     let session = Session::load(None)?;
//!     let mut sink = CollectingSink::new();
//!
//!     session.run_turn("Hello!", &TurnOptions::default(), &mut sink).await?;
//!     println!("Response: {}", sink.text);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod context;
pub mod error;
pub mod paths;
pub mod prompt;
pub mod safe_io;
pub mod session;
pub mod settings;

pub use api::{CollectingSink, RequestPayload, ResponseEvent, ResponseSink, StreamEvent};
pub use context::{CommitReport, ContextStore, RollingContext};
pub use error::{ErrorKind, TurnError};
pub use paths::{AppPaths, StatePaths};
pub use session::{Session, TurnOptions, TurnOutcome, TurnState};
pub use settings::Settings;
