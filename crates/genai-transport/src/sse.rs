//! # SSE Framing
//!
//! Incremental server-sent-event framing for streamed generation responses.
//!
//! - Bytes accumulate in a growing buffer; a frame ends at the earliest blank line
//!   (`\n\n` or `\r\n\r\n`), so how the bytes were split across reads never changes
//!   the frames produced
//! - `data:` lines inside a frame are joined with `\n`; comments, `event:`/`id:`
//!   lines, empty frames, and `[DONE]` produce nothing
//! - A frame whose JSON carries an `error` object is an in-band API failure even
//!   under HTTP 200
//! - Bytes left over when the stream ends mean a truncated message and fail the
//!   sequence

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use genai_core::{GenAiError, Result};
use serde_json::Value;
use tracing::debug;

/// Incremental frame splitter.
#[derive(Debug, Default)]
pub struct SseFramer {
    buffer: BytesMut,
}

impl SseFramer {
    /// Empty framer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
        }
    }

    /// Append raw bytes from the network.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Remove and return the next complete frame (terminator excluded), if any.
    pub fn next_frame(&mut self) -> Option<BytesMut> {
        let (start, len) = find_terminator(&self.buffer)?;
        let mut frame = self.buffer.split_to(start + len);
        frame.truncate(start);
        Some(frame)
    }

    /// Bytes not yet framed.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Check the leftover buffer once the byte stream has ended.
    pub fn finish(&self) -> Result<()> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        Err(GenAiError::StreamFraming {
            message: format!(
                "stream ended mid-frame with {} unframed bytes",
                self.buffer.len()
            ),
        })
    }
}

/// Position and length of the earliest frame terminator.
fn find_terminator(buf: &[u8]) -> Option<(usize, usize)> {
    (0..buf.len()).find_map(|i| {
        let rest = &buf[i..];
        if rest.starts_with(b"\n\n") {
            Some((i, 2))
        } else if rest.starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else {
            None
        }
    })
}

/// Joined `data:` payload of one frame; `None` when the frame carries no data.
pub fn frame_data(frame: &[u8]) -> Result<Option<String>> {
    let text = std::str::from_utf8(frame).map_err(|e| GenAiError::StreamFraming {
        message: format!("frame is not valid UTF-8: {e}"),
    })?;
    let mut data: Option<String> = None;
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some(value) = line.strip_prefix("data:") else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut data {
            Some(joined) => {
                joined.push('\n');
                joined.push_str(value);
            }
            None => data = Some(value.to_string()),
        }
    }
    Ok(data.filter(|d| {
        let trimmed = d.trim();
        !trimmed.is_empty() && trimmed != "[DONE]"
    }))
}

/// Parse one frame into a JSON chunk, surfacing in-band error envelopes.
pub fn decode_frame(frame: &[u8]) -> Result<Option<Value>> {
    let Some(data) = frame_data(frame)? else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(&data).map_err(|e| GenAiError::StreamFraming {
        message: format!("invalid JSON in SSE frame: {e}"),
    })?;
    if let Some(error) = value.get("error").filter(|e| e.is_object()) {
        let status = error["code"]
            .as_u64()
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(500);
        return Err(GenAiError::from_error_envelope(status, error));
    }
    Ok(Some(value))
}

/// Turn a byte stream into a finite stream of JSON chunks.
///
/// The stream ends after the first error.
pub fn json_stream<S, E>(bytes: S) -> impl Stream<Item = Result<Value>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    async_stream::stream! {
        let mut framer = SseFramer::new();
        futures::pin_mut!(bytes);
        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => framer.push(&chunk),
                Err(e) => {
                    yield Err(GenAiError::transport("stream read failed", e));
                    return;
                }
            }
            while let Some(frame) = framer.next_frame() {
                match decode_frame(&frame) {
                    Ok(Some(value)) => yield Ok(value),
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }
        if let Err(e) = framer.finish() {
            debug!(pending = framer.pending(), "SSE stream truncated");
            yield Err(e);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
