//! Persistent-connection state machine states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the persistent gateway connection.
///
/// Transitions are driven by the gateway's reconnection loop:
///
/// ```text
/// Disconnected --connect()--> Connecting
/// Connecting   --open------> Connected
/// Connecting   --failure---> Reconnecting
/// Connected    --close-----> Reconnecting
/// Reconnecting --timer-----> Connecting      (attempts remain)
/// Reconnecting --exhausted-> Failed
/// ```
///
/// `Failed` is terminal until an explicit external `connect()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection and no reconnection pending.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// The connection is open.
    Connected,
    /// Waiting out the fixed delay before the next attempt.
    Reconnecting,
    /// Retry ceiling reached; no further automatic attempts.
    Failed,
}

impl ConnectionState {
    /// Whether no further automatic attempts will be made from this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_failed_is_terminal() {
        assert!(ConnectionState::Failed.is_terminal());
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Reconnecting,
        ] {
            assert!(!state.is_terminal(), "{state} must not be terminal");
        }
    }

    #[test]
    fn display_matches_serde_tag() {
        let json = serde_json::to_string(&ConnectionState::Reconnecting).unwrap();
        assert_eq!(json, format!("\"{}\"", ConnectionState::Reconnecting));
    }
}
