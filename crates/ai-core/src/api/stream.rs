//! Incremental decoding of the newline-delimited JSON response stream.
//!
//! Each line of the body is an independent JSON record:
//!
//! ```text
//! {"response":"Hi"}
//! {"response":" there","done":true,"context":[9,9]}
//! ```
//!
//! [`NdjsonDecoder`] is the pure part: it reassembles lines across network
//! chunk boundaries and turns them into [`StreamEvent`]s. [`GenerateStream`]
//! drives it from an HTTP body.

use crate::error::TurnError;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt::Display;

/// One parsed unit of the response stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Non-empty text increment, to be shown immediately.
    Text(String),
    /// A line that could not be parsed; the stream continues.
    Warning(String),
    /// Successful end of the stream with the raw `context` value, if any.
    Done { context: Option<Value> },
    /// The backend reported an error; the stream stops here.
    Failed(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Failed(_))
    }
}

/// Splits raw body bytes into lines and decodes them into events.
///
/// Nothing is decoded after the first terminal event.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
    pending: VecDeque<StreamEvent>,
    terminated: bool,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body. Complete lines are decoded immediately; a
    /// trailing partial line is kept until more bytes arrive.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.terminated {
            return;
        }
        self.buffer.extend_from_slice(chunk);

        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            self.decode_line(&line[..line.len() - 1]);
            if self.terminated {
                self.buffer.clear();
                return;
            }
        }
    }

    /// Signal end of body; decodes a final unterminated line.
    pub fn finish(&mut self) {
        if self.terminated || self.buffer.is_empty() {
            return;
        }
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line);
    }

    /// Next decoded event, in arrival order.
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        self.pending.pop_front()
    }

    /// Whether a terminal event has been decoded.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn decode_line(&mut self, raw: &[u8]) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                self.pending
                    .push_back(StreamEvent::Warning(format!("invalid UTF-8 in stream: {}", e)));
                return;
            }
        };
        if line.is_empty() {
            return;
        }

        let record: Value = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                self.pending.push_back(StreamEvent::Warning(format!(
                    "skipping malformed stream line ({}): {}",
                    e,
                    preview(line)
                )));
                return;
            }
        };

        if let Some(text) = record.get("response").and_then(Value::as_str)
            && !text.is_empty()
        {
            self.pending.push_back(StreamEvent::Text(text.to_string()));
        }

        if let Some(error) = record.get("error").filter(|e| !e.is_null()) {
            let message = match error.as_str() {
                Some(message) => message.to_string(),
                None => error.to_string(),
            };
            self.pending.push_back(StreamEvent::Failed(message));
            self.terminated = true;
            return;
        }

        if record.get("done").and_then(Value::as_bool).unwrap_or(false) {
            let context = record.get("context").filter(|c| !c.is_null()).cloned();
            self.pending.push_back(StreamEvent::Done { context });
            self.terminated = true;
        }
    }
}

fn preview(line: &str) -> String {
    const MAX: usize = 80;
    match line.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &line[..idx]),
        None => line.to_string(),
    }
}

/// Single-use, in-order source of [`StreamEvent`]s for one response body.
pub struct GenerateStream {
    body: BoxStream<'static, Result<Vec<u8>, String>>,
    decoder: NdjsonDecoder,
    url: String,
    body_ended: bool,
    closed: bool,
}

impl GenerateStream {
    /// Wrap an HTTP response whose status has already been checked.
    pub fn from_response(response: reqwest::Response) -> Self {
        let url = response.url().to_string();
        Self::from_chunks(url, response.bytes_stream())
    }

    /// Wrap any stream of body chunks.
    pub fn from_chunks<S, B, E>(url: impl Into<String>, chunks: S) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]>,
        E: Display,
    {
        let body = chunks
            .map(|chunk| match chunk {
                Ok(bytes) => Ok(bytes.as_ref().to_vec()),
                Err(e) => Err(e.to_string()),
            })
            .boxed();
        Self {
            body,
            decoder: NdjsonDecoder::new(),
            url: url.into(),
            body_ended: false,
            closed: false,
        }
    }

    /// Next event, or `None` once the terminal event (or an error) has been returned.
    ///
    /// A body that fails mid-read or ends before any `done`/`error` record
    /// yields a transport error instead of a terminal event.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent, TurnError>> {
        loop {
            if let Some(event) = self.decoder.next_event() {
                return Some(Ok(event));
            }
            if self.closed || self.decoder.is_terminated() {
                return None;
            }
            if self.body_ended {
                self.closed = true;
                return Some(Err(TurnError::Truncated));
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.decoder.push(&chunk),
                Some(Err(message)) => {
                    self.closed = true;
                    return Some(Err(TurnError::Transport {
                        url: self.url.clone(),
                        message,
                    }));
                }
                None => {
                    self.body_ended = true;
                    self.decoder.finish();
                }
            }
        }
    }
}
