//! Branded ID newtypes for type safety.
//!
//! IDs are distinct newtype wrappers around `String` so a message ID can
//! never be passed where an agent ID is expected. Generated IDs are UUID v7
//! (time-ordered) via [`uuid::Uuid::now_v7`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

branded_id! {
    /// Identifier of a single chat message.
    MessageId
}

branded_id! {
    /// Identifier of the agent (and its session) a chat message belongs to.
    AgentId
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(MessageId::new(), MessageId::new());
    }

    #[test]
    fn from_string_round_trips() {
        let id = AgentId::from_string("agent_42".into());
        assert_eq!(id.as_str(), "agent_42");
        assert_eq!(id.to_string(), "agent_42");
    }

    #[test]
    fn serde_is_transparent() {
        let id = MessageId::from("msg_1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"msg_1\"");
        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn generated_ids_parse_as_uuid() {
        let id = MessageId::new();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }
}
