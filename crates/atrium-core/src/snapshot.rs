//! Scene-graph snapshot value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque scene-graph snapshot with last-write-wins semantics.
///
/// A new `graph` event fully replaces the prior snapshot; there is no
/// incremental merge. The structure of the inner value belongs to the
/// diagram renderer and is never interpreted by the streaming core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneGraphSnapshot(Value);

impl SceneGraphSnapshot {
    /// Wrap a snapshot value received from the server.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the inner value.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume self and return the inner value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for SceneGraphSnapshot {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
