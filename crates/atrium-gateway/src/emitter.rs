//! Typed event fan-out for the persistent connection.
//!
//! Every subscriber gets its own unbounded channel, so no subscriber can
//! block another and every emission is delivered in order. Unsubscription
//! is by disposal: dropping the [`EventStream`] closes its channel and the
//! emitter prunes it on the next emit.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

/// Events published by a [`PersistentConnection`](crate::PersistentConnection).
#[derive(Clone, Debug, PartialEq)]
pub enum GatewayEvent {
    /// The connection opened.
    Connected,
    /// The connection closed (deliberately or not).
    Disconnected,
    /// A connection attempt or the open connection failed.
    Error(String),
    /// The retry ceiling was reached; no further automatic attempts.
    MaxReconnectAttemptsReached,
    /// One successfully decoded inbound JSON payload, forwarded opaquely.
    Message(Value),
}

/// A subscriber's view of the gateway event sequence.
///
/// Dropping the stream unsubscribes.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<GatewayEvent>,
}

impl EventStream {
    /// Receive the next event; `None` once the emitter is gone.
    pub async fn recv(&mut self) -> Option<GatewayEvent> {
        self.rx.recv().await
    }

    /// Receive without waiting; `None` if no event is queued.
    pub fn try_recv(&mut self) -> Option<GatewayEvent> {
        self.rx.try_recv().ok()
    }
}

/// Publish/subscribe hub for [`GatewayEvent`]s.
///
/// Clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct Emitter {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<GatewayEvent>>>>,
}

impl Emitter {
    /// A new emitter with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. The returned stream is the disposer.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        EventStream { rx }
    }

    /// Deliver an event to every live subscriber, pruning dropped ones.
    pub fn emit(&self, event: &GatewayEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers (as of the last emit).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
