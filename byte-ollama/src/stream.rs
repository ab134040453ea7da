//! Decoding of Ollama's streaming chat responses.
//!
//! Ollama streams newline-delimited JSON, one object per line. Network
//! chunks do not respect line boundaries, so bytes are buffered until a full
//! line is available and only then decoded.

use std::collections::VecDeque;
use std::fmt::Display;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::Value;
use tracing::debug;

use byte_core::{ChatError, TextStream};

/// A meaningful event decoded from one stream line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A fragment of assistant text
    Token(String),
    /// The provider reported an error
    Error(String),
    /// The provider signalled the end of the response
    Done,
}

/// Incremental decoder for newline-delimited chat responses.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a terminal event has been decoded.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Buffer a network chunk and decode every complete line in it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            self.decode_line(&line, &mut events);
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        events
    }

    /// Decode whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if !self.done {
            let line = std::mem::take(&mut self.buffer);
            self.decode_line(&line, &mut events);
        }
        self.done = true;
        events
    }

    fn decode_line(&mut self, line: &[u8], events: &mut Vec<StreamEvent>) {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();

        // Skip empty lines
        if line.is_empty() {
            return;
        }

        let json_data = match serde_json::from_str::<Value>(line) {
            Ok(json_data) => json_data,
            Err(e) => {
                debug!("Skipping malformed stream line: {}", e);
                return;
            }
        };

        if let Some(error) = json_data.get("error").and_then(|e| e.as_str()) {
            events.push(StreamEvent::Error(error.to_string()));
            self.done = true;
            return;
        }

        if let Some(content) = json_data
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
        {
            if !content.is_empty() {
                events.push(StreamEvent::Token(content.to_string()));
            }
        }

        if json_data.get("done").and_then(|d| d.as_bool()).unwrap_or(false) {
            events.push(StreamEvent::Done);
            self.done = true;
        }
    }
}

struct TokenState<S> {
    body: S,
    decoder: NdjsonDecoder,
    pending: VecDeque<Result<String, ChatError>>,
    finished: bool,
}

impl<S> TokenState<S> {
    fn enqueue(&mut self, events: Vec<StreamEvent>) {
        for event in events {
            match event {
                StreamEvent::Token(token) => self.pending.push_back(Ok(token)),
                StreamEvent::Error(message) => {
                    self.pending.push_back(Err(ChatError::Upstream(message)));
                    self.finished = true;
                    return;
                }
                StreamEvent::Done => {
                    self.finished = true;
                    return;
                }
            }
        }
    }
}

/// Turn a streamed response body into assistant text fragments.
pub fn token_stream<S, E>(body: S) -> TextStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = TokenState {
        body: Box::pin(body),
        decoder: NdjsonDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(&chunk);
                    state.enqueue(events);
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(ChatError::Request(format!(
                        "Failed to read stream chunk: {}",
                        e
                    ))));
                    state.finished = true;
                }
                None => {
                    let events = state.decoder.finish();
                    state.enqueue(events);
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
