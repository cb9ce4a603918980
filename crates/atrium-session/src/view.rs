//! Immutable read-model published by the coordinator.

use std::sync::Arc;

use atrium_core::{ChatMessage, SceneGraphSnapshot};

/// Point-in-time snapshot of one session's conversational state.
///
/// Published on a `tokio::sync::watch` channel after every mutation; readers
/// only ever see a fully consistent snapshot, never a partially applied
/// update. The message list is shared behind an [`Arc`] so cloning a view is
/// cheap regardless of history length.
#[derive(Clone, Debug, Default)]
pub struct SessionView {
    /// Chat history, oldest first.
    pub messages: Arc<Vec<ChatMessage>>,
    /// Latest scene graph, replaced wholesale on each update.
    pub snapshot: Option<SceneGraphSnapshot>,
    /// Most recent user-visible error, if any.
    pub last_error: Option<String>,
    /// Whether a chat turn is currently streaming.
    pub in_flight: bool,
}

impl SessionView {
    /// The pending agent message of the current turn, if one exists.
    #[must_use]
    pub fn pending_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.is_pending())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
