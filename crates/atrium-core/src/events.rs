//! Events decoded from a streaming chat response.
//!
//! Each frame of the chat endpoint's chunked body carries one JSON document
//! tagged by `type`. A stream produces any number of `token` / `reason` /
//! `graph` events followed by exactly one terminal `done` or `error`; nothing
//! follows the terminal event.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One decoded event from a streaming chat response.
///
/// These are transient (never persisted) and drive incremental UI updates
/// while an agent answer is being generated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Incremental answer text.
    Token {
        /// Text fragment to append to the answer.
        value: String,
    },

    /// Incremental reasoning text.
    Reason {
        /// Text fragment to append to the reasoning trace.
        value: String,
    },

    /// Full scene-graph snapshot replacement (last-write-wins, no merge).
    Graph {
        /// The new snapshot value, forwarded opaquely.
        graph: Value,
    },

    /// Terminal: the stream completed successfully.
    Done,

    /// Terminal: the stream failed.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

impl StreamEvent {
    /// Whether this event terminates the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
