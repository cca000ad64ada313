//! CLI-specific response sink for terminal output.
//!
//! Answer text is written and flushed chunk by chunk so the user sees the
//! model typing; diagnostics are routed through [`OutputHandler`].

use ai_core::{ResponseEvent, ResponseSink};
use std::io::{self, Write};

use crate::output::OutputHandler;

/// Connects the session's event stream to the terminal.
pub struct CliResponseSink<'a, W: Write> {
    output: &'a OutputHandler,
    writer: W,
    ends_with_newline: bool,
    wrote_text: bool,
}

impl<'a, W: Write> CliResponseSink<'a, W> {
    pub fn new(output: &'a OutputHandler, writer: W) -> Self {
        Self {
            output,
            writer,
            ends_with_newline: true,
            wrote_text: false,
        }
    }

    #[cfg(test)]
    fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> ResponseSink for CliResponseSink<'_, W> {
    fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()> {
        match event {
            ResponseEvent::TextChunk(chunk) => {
                if chunk.is_empty() {
                    return Ok(());
                }
                self.writer.write_all(chunk.as_bytes())?;
                self.writer.flush()?;
                self.wrote_text = true;
                self.ends_with_newline = chunk.ends_with('\n');
            }
            ResponseEvent::Diagnostic {
                message,
                verbose_only,
            } => {
                if verbose_only {
                    self.output.diagnostic(&message);
                } else {
                    self.output.diagnostic_always(&message);
                }
            }
            ResponseEvent::Finished => {
                // Leave the shell prompt on its own line.
                if self.wrote_text && !self.ends_with_newline {
                    self.writer.write_all(b"\n")?;
                    self.ends_with_newline = true;
                }
                self.writer.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(sink: CliResponseSink<'_, Vec<u8>>) -> String {
        String::from_utf8(sink.into_writer()).unwrap()
    }

    #[test]
    fn test_chunks_written_in_order() {
        let output = OutputHandler::new(false);
        let mut sink = CliResponseSink::new(&output, Vec::new());

        sink.handle(ResponseEvent::TextChunk("Hi")).unwrap();
        sink.handle(ResponseEvent::TextChunk(" there")).unwrap();
        sink.handle(ResponseEvent::Finished).unwrap();

        assert_eq!(written(sink), "Hi there\n");
    }

    #[test]
    fn test_no_double_newline() {
        let output = OutputHandler::new(false);
        let mut sink = CliResponseSink::new(&output, Vec::new());

        sink.handle(ResponseEvent::TextChunk("done\n")).unwrap();
        sink.handle(ResponseEvent::Finished).unwrap();

        assert_eq!(written(sink), "done\n");
    }

    #[test]
    fn test_finished_without_text_writes_nothing() {
        let output = OutputHandler::new(false);
        let mut sink = CliResponseSink::new(&output, Vec::new());

        sink.handle(ResponseEvent::Finished).unwrap();

        assert_eq!(written(sink), "");
    }

    #[test]
    fn test_diagnostics_stay_off_stdout() {
        let output = OutputHandler::new(true);
        let mut sink = CliResponseSink::new(&output, Vec::new());

        sink.handle(ResponseEvent::Diagnostic {
            message: "[Context pruned: 7 -> 3 elements]".to_string(),
            verbose_only: true,
        })
        .unwrap();
        sink.handle(ResponseEvent::TextChunk("ok")).unwrap();

        assert_eq!(written(sink), "ok");
    }

    #[test]
    fn test_finished_twice_is_harmless() {
        let output = OutputHandler::new(false);
        let mut sink = CliResponseSink::new(&output, Vec::new());

        sink.handle(ResponseEvent::TextChunk("partial")).unwrap();
        sink.handle(ResponseEvent::Finished).unwrap();
        sink.handle(ResponseEvent::Finished).unwrap();

        assert_eq!(written(sink), "partial\n");
    }
}
