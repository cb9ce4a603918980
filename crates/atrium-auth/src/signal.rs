//! Process-wide credentials-expired broadcast.

use tokio::sync::broadcast;
use tracing::debug;

/// Default buffer size for the broadcast channel.
const DEFAULT_CAPACITY: usize = 16;

/// Events published on the auth signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    /// The held credential was rejected (401) or found expired locally.
    CredentialsExpired,
}

/// Broadcast channel for auth lifecycle events.
///
/// Cloneable handle; every clone publishes to the same subscribers. Fired
/// by the streaming client on a 401 response or a locally expired
/// credential; consumed by the auth collaborator (e.g. to redirect to a
/// login screen).
#[derive(Clone)]
pub struct AuthSignal {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthSignal {
    /// A new signal with the default subscriber buffer.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx }
    }

    /// Subscribe to auth events. Dropping the receiver unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    /// Publish [`AuthEvent::CredentialsExpired`] to all subscribers.
    ///
    /// A send with no live subscribers is not an error.
    pub fn notify_expired(&self) {
        let receivers = self.tx.send(AuthEvent::CredentialsExpired).unwrap_or(0);
        debug!(receivers, "credentials-expired signal fired");
    }
}

impl Default for AuthSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
