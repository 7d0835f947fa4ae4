//! Server-sent events decoding for streamed completions.
//!
//! The response body is buffered and split into events on a blank line.
//! Each event's `data:` lines are joined into one payload and handed to a
//! provider-specific parser returning `Vec<Result<StreamEvent>>`.
//!
//! - [`drain_events`] -- pull complete payloads out of a buffer
//! - [`sse_response_stream`] -- build a `BoxStream` from a response + parser

use crate::util::from_reqwest;
use mc_domain::error::Result;
use mc_domain::stream::{BoxStream, StreamEvent, FINISH_INCOMPLETE};

/// Extract complete event payloads from an SSE buffer.
///
/// Google's endpoint terminates lines with `\r\n`, so carriage returns
/// are dropped as they enter the buffer.  Multiple `data:` lines inside
/// one event are joined with `\n`.  Consumed bytes are removed; a trailing
/// partial event stays in the buffer for the next call.
pub(crate) fn drain_events(buffer: &mut String) -> Vec<String> {
    if buffer.contains('\r') {
        *buffer = buffer.replace('\r', "");
    }

    let mut payloads = Vec::new();

    while let Some(pos) = buffer.find("\n\n") {
        let block: String = buffer.drain(..pos + 2).collect();

        let data: Vec<&str> = block
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .collect();

        if !data.is_empty() {
            payloads.push(data.join("\n"));
        }
    }

    payloads
}

/// Move the longest valid UTF-8 prefix of `bytes` into `out`.
///
/// An incomplete trailing sequence stays in `bytes` until the next chunk
/// completes it; genuinely invalid bytes are replaced.
pub(crate) fn decode_utf8_prefix(bytes: &mut Vec<u8>, out: &mut String) {
    match std::str::from_utf8(bytes) {
        Ok(s) => {
            out.push_str(s);
            bytes.clear();
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            out.push_str(&String::from_utf8_lossy(&bytes[..valid]));
            bytes.drain(..valid);
        }
        Err(_) => {
            out.push_str(&String::from_utf8_lossy(bytes));
            bytes.clear();
        }
    }
}

/// Build a [`BoxStream`] from an SSE `reqwest::Response` and a parser closure.
///
/// The stream flushes whatever remains in the buffer when the body closes
/// and, if the parser never produced a `Done`, closes with one carrying
/// [`FINISH_INCOMPLETE`]: a body that stops short of a finish reason was
/// cut off, not completed.  A body read error ends the stream with that
/// error.
pub(crate) fn sse_response_stream<F>(
    response: reqwest::Response,
    mut parse_data: F,
) -> BoxStream<'static, Result<StreamEvent>>
where
    F: FnMut(&str) -> Vec<Result<StreamEvent>> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut response = response;
        let mut buffer = String::new();
        let mut undecoded: Vec<u8> = Vec::new();
        let mut done_emitted = false;
        let mut finished = false;

        while !finished {
            let payloads = match response.chunk().await {
                Ok(Some(bytes)) => {
                    undecoded.extend_from_slice(&bytes);
                    decode_utf8_prefix(&mut undecoded, &mut buffer);
                    drain_events(&mut buffer)
                }
                Ok(None) => {
                    finished = true;
                    if buffer.trim().is_empty() {
                        Vec::new()
                    } else {
                        buffer.push_str("\n\n");
                        drain_events(&mut buffer)
                    }
                }
                Err(e) => {
                    yield Err(from_reqwest(e));
                    return;
                }
            };

            for data in payloads {
                for event in parse_data(&data) {
                    done_emitted |= matches!(&event, Ok(StreamEvent::Done { .. }));
                    yield event;
                }
            }
        }

        if !done_emitted {
            yield Ok(StreamEvent::Done {
                usage: None,
                finish_reason: Some(FINISH_INCOMPLETE.into()),
            });
        }
    };

    Box::pin(stream)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
