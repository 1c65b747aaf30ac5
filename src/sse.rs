//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module turns the raw byte stream of a streaming chat completion into
//! a stream of parsed [`ChatCompletionChunk`] values, handling buffering,
//! multi-byte characters split across network reads, the `[DONE]` sentinel,
//! and errors reported in-band by the provider.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::types::{ApiErrorObject, ChatCompletionChunk, ErrorResponse};
use crate::{Error, Result};

/// The sentinel payload that terminates a completion stream.
const DONE_SENTINEL: &str = "[DONE]";

/// One decoded SSE event.
#[derive(Debug)]
enum Frame {
    Chunk(ChatCompletionChunk),
    Done,
    Skip,
}

/// Process a stream of bytes into a stream of chat completion chunks.
///
/// The returned stream ends after the `[DONE]` sentinel or when the
/// underlying byte stream ends, whichever comes first.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });
    decode(stream)
}

/// Decode an already error-mapped byte stream.
///
/// Split out from [`process_sse`] so it can be driven without a live HTTP
/// response.
pub(crate) fn decode<S>(stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>> + Send
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin + 'static,
{
    let state = DecodeState {
        stream,
        buffer: String::new(),
        pending: Vec::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        loop {
            // First check if we have a complete event in the buffer
            if let Some((frame, remaining)) = extract_event(&state.buffer) {
                state.buffer = remaining;
                match frame {
                    Ok(Frame::Chunk(chunk)) => return Some((Ok(chunk), state)),
                    Ok(Frame::Done) => return None,
                    Ok(Frame::Skip) => continue,
                    Err(e) => return Some((Err(e), state)),
                }
            }

            // Read more data
            match state.stream.next().await {
                Some(Ok(bytes)) => {
                    if let Err(e) = state.push_bytes(&bytes) {
                        state.finished = true;
                        return Some((Err(e), state));
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    // End of stream: treat a trailing unterminated event as complete.
                    state.finished = true;
                    if state.buffer.trim().is_empty() {
                        return None;
                    }
                    state.buffer.push_str("\n\n");
                    return match extract_event(&state.buffer) {
                        Some((Ok(Frame::Chunk(chunk)), _)) => Some((Ok(chunk), state)),
                        Some((Err(e), _)) => Some((Err(e), state)),
                        _ => None,
                    };
                }
            }
        }
    })
}

struct DecodeState<S> {
    stream: S,
    buffer: String,
    pending: Vec<u8>,
    finished: bool,
}

impl<S> DecodeState<S> {
    /// Append bytes to the text buffer, holding back an incomplete trailing
    /// UTF-8 sequence until the next read completes it.
    fn push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.pending.len()
            }
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                let text = std::str::from_utf8(&self.pending[..valid])?;
                self.buffer.push_str(text);
                valid
            }
            Err(e) => {
                return Err(Error::encoding(
                    format!("Invalid UTF-8 in stream: {e}"),
                    Some(Box::new(e)),
                ));
            }
        };
        self.pending.drain(..valid);
        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }
        Ok(())
    }
}

/// Extract a complete SSE event from a buffer string.
///
/// Events are delimited by a blank line. Only `data:` fields matter; comment
/// lines and other fields are ignored.
fn extract_event(buffer: &str) -> Option<(Result<Frame>, String)> {
    let (event_text, rest) = buffer.split_once("\n\n")?;
    let rest = rest.to_string();

    let data = event_text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|line| line.strip_prefix(' ').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n");

    if data.trim().is_empty() {
        return Some((Ok(Frame::Skip), rest));
    }
    if data.trim() == DONE_SENTINEL {
        return Some((Ok(Frame::Done), rest));
    }

    if let Ok(response) = serde_json::from_str::<ErrorResponse>(&data) {
        return Some((Err(stream_error(response.error)), rest));
    }

    match serde_json::from_str::<ChatCompletionChunk>(&data) {
        Ok(chunk) => Some((Ok(Frame::Chunk(chunk)), rest)),
        Err(e) => Some((
            Err(Error::serialization(
                format!("Failed to parse event JSON: {e}"),
                Some(Box::new(e)),
            )),
            rest,
        )),
    }
}

/// Map an error reported inside the stream onto the crate error type.
fn stream_error(error: ApiErrorObject) -> Error {
    match error.code.as_deref() {
        Some("invalid_api_key") => Error::authentication(error.message),
        Some("model_not_found") => Error::not_found(error.message),
        _ => Error::api(500, error.error_type, error.message),
    }
}
