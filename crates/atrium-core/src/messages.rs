//! Chat message types.
//!
//! A [`ChatMessage`] carries an explicit [`MessageStatus`] tag so the UI can
//! distinguish an optimistic pending message from a confirmed or failed one
//! without inferring state from in-flight booleans. A message is never
//! mutated after being marked [`MessageStatus::Complete`]; messages are only
//! removed by an explicit clear-history operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, MessageId};

/// Who authored a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The console user.
    User,
    /// The conversational agent.
    Agent,
}

/// Reconciliation status of an optimistically created message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Created optimistically; the server has not confirmed it yet.
    Pending,
    /// Confirmed complete. The message text no longer changes.
    Complete,
    /// The stream producing this message failed.
    Failed,
}

/// One entry in the session's chat history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID.
    pub id: MessageId,
    /// Message author.
    pub role: Role,
    /// Answer text (accumulated incrementally for agent messages).
    pub text: String,
    /// Reasoning trace, if the agent emitted one.
    pub reasoning: Option<String>,
    /// Reconciliation status.
    pub status: MessageStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Owning agent/session.
    pub agent_id: AgentId,
}

impl ChatMessage {
    /// A completed user message, created on submission.
    #[must_use]
    pub fn user(text: impl Into<String>, agent_id: AgentId) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            text: text.into(),
            reasoning: None,
            status: MessageStatus::Complete,
            created_at: Utc::now(),
            agent_id,
        }
    }

    /// An empty, pending agent message awaiting streamed content.
    #[must_use]
    pub fn agent_pending(agent_id: AgentId) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Agent,
            text: String::new(),
            reasoning: None,
            status: MessageStatus::Pending,
            created_at: Utc::now(),
            agent_id,
        }
    }

    /// Append incremental answer text.
    pub fn append_text(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    /// Append incremental reasoning text.
    pub fn append_reasoning(&mut self, fragment: &str) {
        self.reasoning.get_or_insert_with(String::new).push_str(fragment);
    }

    /// Mark the message complete. Completed messages are never mutated again.
    pub fn mark_complete(&mut self) {
        self.status = MessageStatus::Complete;
    }

    /// Mark the message failed.
    pub fn mark_failed(&mut self) {
        self.status = MessageStatus::Failed;
    }

    /// Whether this message is still awaiting confirmation.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
