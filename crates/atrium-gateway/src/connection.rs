//! Persistent connection driver and reconnection state machine.

use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use atrium_core::ConnectionState;

use crate::emitter::{Emitter, EventStream, GatewayEvent};

/// Configuration for a [`PersistentConnection`].
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// WebSocket URL of the push gateway.
    pub url: String,
    /// Fixed retry ceiling. Attempts reset to zero only on a successful open.
    pub max_reconnect_attempts: u32,
    /// Fixed delay between reconnection attempts.
    pub reconnect_interval: Duration,
}

/// Handle to the spawned driver task of one `connect()` invocation.
struct DriverHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// One persistent push connection with bounded automatic reconnection.
///
/// Owns at most one physical connection at a time. `connect()` while
/// already connecting/connected tears the existing connection down first
/// (last caller wins); concurrent `connect()` calls must be serialized by
/// the caller.
pub struct PersistentConnection {
    config: GatewayConfig,
    emitter: Emitter,
    state_tx: watch::Sender<ConnectionState>,
    /// Writer for the currently open session; `None` whenever not connected.
    outbound: Arc<Mutex<Option<mpsc::UnboundedSender<Value>>>>,
    driver: Mutex<Option<DriverHandle>>,
}

impl PersistentConnection {
    /// Create a connection in the `Disconnected` state. No I/O happens
    /// until `connect()`.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let (state_tx, _state_rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            emitter: Emitter::new(),
            state_tx,
            outbound: Arc::new(Mutex::new(None)),
            driver: Mutex::new(None),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Watch state transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to lifecycle and message events. Dropping the returned
    /// stream unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        self.emitter.subscribe()
    }

    /// Start (or restart) the connection.
    ///
    /// Any existing connection is torn down first. Resets the attempt
    /// counter: a `Failed` connection becomes eligible to retry again.
    pub async fn connect(&self) {
        self.teardown().await;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_driver(
            self.config.clone(),
            self.emitter.clone(),
            self.state_tx.clone(),
            Arc::clone(&self.outbound),
            cancel.clone(),
        ));
        *self.driver.lock() = Some(DriverHandle { cancel, task });
    }

    /// Close the connection and suspend automatic reconnection until the
    /// next `connect()`.
    pub async fn disconnect(&self) {
        self.teardown().await;
        let _ = self.state_tx.send_replace(ConnectionState::Disconnected);
    }

    /// Fire-and-forget send.
    ///
    /// If not currently connected the payload is dropped silently — no
    /// error, no queueing. Callers that need delivery must check
    /// [`state`](Self::state) themselves.
    pub fn send(&self, payload: &Value) {
        let guard = self.outbound.lock();
        if let Some(tx) = guard.as_ref() {
            if tx.send(payload.clone()).is_err() {
                debug!("gateway writer gone, payload dropped");
            }
        } else {
            debug!("not connected, payload dropped");
        }
    }

    /// Stop the driver task, if any, and wait for it to exit.
    async fn teardown(&self) {
        let handle = self.driver.lock().take();
        if let Some(handle) = handle {
            handle.cancel.cancel();
            let _ = handle.task.await;
        }
        *self.outbound.lock() = None;
    }
}

impl Drop for PersistentConnection {
    fn drop(&mut self) {
        if let Some(handle) = self.driver.lock().take() {
            handle.cancel.cancel();
            handle.task.abort();
        }
    }
}

/// How one open WebSocket session ended.
#[derive(PartialEq, Eq)]
enum SessionEnd {
    /// Torn down by `disconnect()`/`connect()`.
    Cancelled,
    /// Closed by the server or a transport failure.
    Remote,
}

/// Connection loop: attempt, drive the open session, back off, repeat.
///
/// The attempt counter increments on every `Connecting` entry and resets
/// only on a successful open. Every failure passes through `Reconnecting`;
/// exhaustion there moves to the terminal `Failed` state with exactly one
/// `MaxReconnectAttemptsReached` emission.
async fn run_driver(
    config: GatewayConfig,
    emitter: Emitter,
    state_tx: watch::Sender<ConnectionState>,
    outbound: Arc<Mutex<Option<mpsc::UnboundedSender<Value>>>>,
    cancel: CancellationToken,
) {
    let mut attempts: u32 = 0;

    loop {
        let _ = state_tx.send_replace(ConnectionState::Connecting);
        attempts += 1;
        debug!(attempt = attempts, url = %config.url, "connecting to gateway");

        let connected = tokio::select! {
            () = cancel.cancelled() => {
                let _ = state_tx.send_replace(ConnectionState::Disconnected);
                return;
            }
            result = connect_async(config.url.as_str()) => result,
        };

        match connected {
            Ok((ws, _response)) => {
                attempts = 0;
                let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
                *outbound.lock() = Some(outbound_tx);
                let _ = state_tx.send_replace(ConnectionState::Connected);
                emitter.emit(&GatewayEvent::Connected);
                info!(url = %config.url, "gateway connected");

                let end = drive_session(ws, outbound_rx, &emitter, &cancel).await;

                *outbound.lock() = None;
                emitter.emit(&GatewayEvent::Disconnected);
                if end == SessionEnd::Cancelled {
                    let _ = state_tx.send_replace(ConnectionState::Disconnected);
                    return;
                }
                warn!("gateway connection closed");
            }
            Err(e) => {
                warn!(attempt = attempts, error = %e, "gateway connection attempt failed");
                emitter.emit(&GatewayEvent::Error(e.to_string()));
            }
        }

        let _ = state_tx.send_replace(ConnectionState::Reconnecting);
        if attempts >= config.max_reconnect_attempts {
            let _ = state_tx.send_replace(ConnectionState::Failed);
            emitter.emit(&GatewayEvent::MaxReconnectAttemptsReached);
            warn!(attempts, "gateway reconnect attempts exhausted");
            return;
        }

        tokio::select! {
            () = cancel.cancelled() => {
                let _ = state_tx.send_replace(ConnectionState::Disconnected);
                return;
            }
            () = tokio::time::sleep(config.reconnect_interval) => {}
        }
    }
}

/// Drive one open WebSocket session until it ends.
///
/// Inbound text payloads are JSON-parsed and forwarded as `Message`
/// events; malformed payloads are dropped silently. Outbound payloads
/// arrive over `outbound_rx` only while this session is alive.
async fn drive_session<S>(
    ws: S,
    mut outbound_rx: mpsc::UnboundedReceiver<Value>,
    emitter: &Emitter,
    cancel: &CancellationToken,
) -> SessionEnd
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return SessionEnd::Cancelled;
            }
            payload = outbound_rx.recv() => {
                // The sender lives in the shared outbound slot for the whole
                // session, so `None` cannot happen while we are here.
                if let Some(payload) = payload {
                    if let Err(e) = sink.send(Message::text(payload.to_string())).await {
                        warn!(error = %e, "gateway send failed");
                        return SessionEnd::Remote;
                    }
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<Value>(text.as_str()) {
                            Ok(value) => emitter.emit(&GatewayEvent::Message(value)),
                            Err(e) => debug!(error = %e, "dropping malformed gateway payload"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Remote,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "gateway read error");
                        emitter.emit(&GatewayEvent::Error(e.to_string()));
                        return SessionEnd::Remote;
                    }
                }
            }
        }
    }
}
