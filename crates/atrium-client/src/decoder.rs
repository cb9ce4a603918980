//! Frame decoder for the streaming chat response body.
//!
//! The response body is a sequence of frames. Each frame is a payload line
//! prefixed by the `data:` marker and terminated by a blank line:
//!
//! ```text
//! data: {"type":"token","value":"He"}
//!
//! data: {"type":"done"}
//!
//! ```
//!
//! Fragments arrive with arbitrary boundaries — a frame may span several
//! fragments, and one fragment may hold several frames. The decoder keeps a
//! carry buffer, yields one decoded event per complete frame in order, and
//! retains the trailing incomplete fragment for the next call.
//!
//! A decoder instance is consumed by exactly one producer; it holds no
//! shared state and performs no I/O.

use bytes::BytesMut;
use thiserror::Error;

use atrium_core::StreamEvent;

/// Marker prefixing the payload line of a frame.
const PAYLOAD_MARKER: &str = "data:";

/// Initial carry-buffer capacity.
const BUFFER_CAPACITY: usize = 8192;

/// A single frame failed to decode. Subsequent frames are unaffected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload line was not valid JSON for a known event shape.
    #[error("frame payload is not valid JSON: {message}")]
    InvalidJson {
        /// Parser error description.
        message: String,
    },

    /// The frame bytes were not valid UTF-8.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,
}

/// Incremental decoder from text fragments to [`StreamEvent`]s.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    /// A new decoder with an empty carry buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(BUFFER_CAPACITY),
        }
    }

    /// Feed one fragment and decode every frame it completes.
    ///
    /// Returns one entry per completed frame, in order: the decoded event,
    /// or a [`DecodeError`] if that frame's payload was malformed. A frame
    /// with no payload-marker line yields nothing. Data after the last
    /// frame delimiter stays buffered for the next call.
    pub fn feed(&mut self, fragment: &[u8]) -> Vec<Result<StreamEvent, DecodeError>> {
        self.buffer.extend_from_slice(fragment);

        let mut decoded = Vec::new();
        while let Some((frame_len, delimiter_len)) = find_frame_boundary(&self.buffer) {
            let frame = self.buffer.split_to(frame_len + delimiter_len);
            if let Some(result) = decode_frame(&frame[..frame_len]) {
                decoded.push(result);
            }
        }
        decoded
    }

    /// Whether the buffer holds an incomplete frame.
    ///
    /// If the fragment sequence ends while this is `true`, the partial data
    /// is discarded — the server is expected to terminate every frame with
    /// a blank line.
    #[must_use]
    pub fn has_partial_frame(&self) -> bool {
        !self.buffer.is_empty()
    }
}

/// Find the end of the first complete frame in `buf`.
///
/// Returns `(frame_len, delimiter_len)` where the delimiter is the blank
/// line ending the frame (`\n\n`, or `\n\r\n` for CRLF bodies).
fn find_frame_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    for (i, &byte) in buf.iter().enumerate() {
        if byte != b'\n' {
            continue;
        }
        match (buf.get(i + 1), buf.get(i + 2)) {
            (Some(b'\n'), _) => return Some((i, 2)),
            (Some(b'\r'), Some(b'\n')) => return Some((i, 3)),
            _ => {}
        }
    }
    None
}

/// Decode one complete frame.
///
/// Only the first line carrying the payload marker is parsed; other lines
/// are ignored. Returns `None` for frames with no payload line.
fn decode_frame(frame: &[u8]) -> Option<Result<StreamEvent, DecodeError>> {
    let Ok(text) = std::str::from_utf8(frame) else {
        return Some(Err(DecodeError::InvalidUtf8));
    };

    for line in text.lines() {
        let Some(payload) = line.trim().strip_prefix(PAYLOAD_MARKER) else {
            continue;
        };
        let payload = payload.trim();
        if payload.is_empty() {
            continue;
        }
        return Some(
            serde_json::from_str::<StreamEvent>(payload).map_err(|e| {
                DecodeError::InvalidJson {
                    message: e.to_string(),
                }
            }),
        );
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
