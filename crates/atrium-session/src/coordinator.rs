//! Single-writer session state coordinator.
//!
//! All mutable session state lives inside one spawned event-loop task. Every
//! input — user submission, decoded stream event, request failure, gateway
//! payload, clear-history — arrives over a single `mpsc` channel, so handler
//! invocations never overlap and inputs apply in arrival order. Readers
//! observe immutable [`SessionView`] snapshots through a `watch` channel and
//! never touch the state directly.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, warn};

use atrium_client::{ChatRequest, ChatStreamClient};
use atrium_core::{AgentId, ChatMessage, SceneGraphSnapshot, StreamEvent};
use atrium_gateway::{EventStream, GatewayEvent, PersistentConnection};

use crate::errors::{CoordinatorError, Result};
use crate::view::SessionView;

/// Capacity of the broadcast error channel.
const ERROR_CHANNEL_CAPACITY: usize = 16;

/// A session-relevant update extracted from a raw gateway payload.
#[derive(Clone, Debug)]
pub enum GatewayUpdate {
    /// A fresh scene graph; replaces the current snapshot wholesale.
    Graph(Value),
    /// A user-visible error pushed by the backend.
    Error(String),
}

/// Maps raw gateway payloads to session updates.
///
/// The coordinator does not interpret gateway traffic itself; the caller
/// supplies the discriminator. The default dispatcher recognizes nothing,
/// so every payload is ignored until the application opts in.
pub type GatewayDispatcher = Arc<dyn Fn(&Value) -> Option<GatewayUpdate> + Send + Sync>;

/// Inputs to the coordinator's event loop.
enum Input {
    Submit {
        text: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Stream(StreamEvent),
    TurnFailed(String),
    Gateway(Value),
    ClearHistory,
}

/// Handle to one session's state coordinator.
///
/// Cheap to clone; all clones feed the same event loop. Dropping every
/// handle (and every attached gateway forwarder) shuts the loop down.
#[derive(Clone)]
pub struct SessionCoordinator {
    input_tx: mpsc::UnboundedSender<Input>,
    view_rx: watch::Receiver<SessionView>,
    error_tx: broadcast::Sender<String>,
}

impl SessionCoordinator {
    /// Create a coordinator with the default (ignore-everything) gateway
    /// dispatcher.
    #[must_use]
    pub fn new(client: ChatStreamClient, agent_id: AgentId, user: impl Into<String>) -> Self {
        Self::with_dispatcher(client, agent_id, user, Arc::new(|_| None))
    }

    /// Create a coordinator with a caller-supplied gateway dispatcher.
    #[must_use]
    pub fn with_dispatcher(
        client: ChatStreamClient,
        agent_id: AgentId,
        user: impl Into<String>,
        dispatcher: GatewayDispatcher,
    ) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(SessionView::default());
        let (error_tx, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);

        let event_loop = EventLoop {
            client,
            agent_id,
            user: user.into(),
            dispatcher,
            input_tx: input_tx.downgrade(),
            view_tx,
            error_tx: error_tx.clone(),
            messages: Vec::new(),
            snapshot: None,
            last_error: None,
            in_flight: false,
        };
        drop(tokio::spawn(event_loop.run(input_rx)));

        Self {
            input_tx,
            view_rx,
            error_tx,
        }
    }

    /// Submit a user message and start one streaming chat turn.
    ///
    /// At most one turn runs per session; while one is in flight further
    /// submissions are rejected with [`CoordinatorError::Busy`] rather than
    /// interleaved into an undefined merge order.
    pub async fn submit(&self, text: impl Into<String>) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.input_tx
            .send(Input::Submit {
                text: text.into(),
                reply: reply_tx,
            })
            .map_err(|_| CoordinatorError::Closed)?;
        reply_rx.await.map_err(|_| CoordinatorError::Closed)?
    }

    /// Empty the chat history.
    ///
    /// Invoked after the backend's clear request succeeds; the backend call
    /// itself is the caller's collaborator, not the coordinator's.
    pub fn clear_history(&self) -> Result<()> {
        self.input_tx
            .send(Input::ClearHistory)
            .map_err(|_| CoordinatorError::Closed)
    }

    /// Current state snapshot.
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.view_rx.borrow().clone()
    }

    /// Watch channel of state snapshots; updated after every mutation.
    #[must_use]
    pub fn watch_view(&self) -> watch::Receiver<SessionView> {
        self.view_rx.clone()
    }

    /// Subscribe to user-visible error messages.
    #[must_use]
    pub fn errors(&self) -> broadcast::Receiver<String> {
        self.error_tx.subscribe()
    }

    /// Forward gateway payloads from a live connection into this session.
    pub fn attach_gateway(&self, connection: &PersistentConnection) {
        self.attach_gateway_stream(connection.subscribe());
    }

    /// Forward gateway payloads from an already-subscribed event stream.
    pub fn attach_gateway_stream(&self, mut stream: EventStream) {
        let input_tx = self.input_tx.downgrade();
        drop(tokio::spawn(async move {
            while let Some(event) = stream.recv().await {
                let Some(tx) = input_tx.upgrade() else { return };
                if let GatewayEvent::Message(payload) = event {
                    if tx.send(Input::Gateway(payload)).is_err() {
                        return;
                    }
                }
            }
        }));
    }
}

/// The event-loop task: sole owner of the session's mutable state.
struct EventLoop {
    client: ChatStreamClient,
    agent_id: AgentId,
    user: String,
    dispatcher: GatewayDispatcher,
    /// Weak handle for spawned turn tasks; weak so in-flight turns never
    /// keep a dropped coordinator alive.
    input_tx: mpsc::WeakUnboundedSender<Input>,
    view_tx: watch::Sender<SessionView>,
    error_tx: broadcast::Sender<String>,
    messages: Vec<ChatMessage>,
    snapshot: Option<SceneGraphSnapshot>,
    last_error: Option<String>,
    in_flight: bool,
}

impl EventLoop {
    async fn run(mut self, mut input_rx: mpsc::UnboundedReceiver<Input>) {
        while let Some(input) = input_rx.recv().await {
            match input {
                Input::Submit { text, reply } => {
                    let _ = reply.send(self.handle_submit(text));
                }
                Input::Stream(event) => self.handle_stream_event(event),
                Input::TurnFailed(message) => {
                    // A terminal `error` event may already have closed the
                    // turn; only a still-open turn fails here.
                    if self.in_flight {
                        self.fail_turn(message);
                    }
                }
                Input::Gateway(payload) => self.handle_gateway(&payload),
                Input::ClearHistory => {
                    self.messages.clear();
                    self.publish();
                }
            }
        }
        debug!("session coordinator event loop stopped");
    }

    fn handle_submit(&mut self, text: String) -> Result<()> {
        if self.in_flight {
            return Err(CoordinatorError::Busy);
        }

        self.messages
            .push(ChatMessage::user(text.clone(), self.agent_id.clone()));
        self.messages
            .push(ChatMessage::agent_pending(self.agent_id.clone()));
        self.in_flight = true;
        self.last_error = None;
        self.publish();

        let request = ChatRequest {
            message: text,
            user: self.user.clone(),
            agent_id: self.agent_id.to_string(),
        };
        let client = self.client.clone();
        let input_tx = self.input_tx.clone();
        drop(tokio::spawn(async move {
            let forward_tx = input_tx.clone();
            let outcome = client
                .send_chat(&request, move |event| {
                    if let Some(tx) = forward_tx.upgrade() {
                        let _ = tx.send(Input::Stream(event));
                    }
                })
                .await;
            if let Err(err) = outcome {
                if let Some(tx) = input_tx.upgrade() {
                    let _ = tx.send(Input::TurnFailed(err.to_string()));
                }
            }
        }));
        Ok(())
    }

    fn handle_stream_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Token { value } => {
                if let Some(message) = self.pending_message_mut() {
                    message.append_text(&value);
                    self.publish();
                } else {
                    warn!("token event with no pending message; dropped");
                }
            }
            StreamEvent::Reason { value } => {
                if let Some(message) = self.pending_message_mut() {
                    message.append_reasoning(&value);
                    self.publish();
                } else {
                    warn!("reason event with no pending message; dropped");
                }
            }
            StreamEvent::Graph { graph } => {
                self.snapshot = Some(SceneGraphSnapshot::new(graph));
                self.publish();
            }
            StreamEvent::Done => {
                if let Some(message) = self.pending_message_mut() {
                    message.mark_complete();
                }
                self.in_flight = false;
                self.publish();
            }
            StreamEvent::Error { message } => self.fail_turn(message),
        }
    }

    fn handle_gateway(&mut self, payload: &Value) {
        match (self.dispatcher)(payload) {
            Some(GatewayUpdate::Graph(graph)) => {
                self.snapshot = Some(SceneGraphSnapshot::new(graph));
                self.publish();
            }
            Some(GatewayUpdate::Error(message)) => {
                // Errors fail the current turn no matter which channel
                // delivered them; with no turn open only the error string
                // is updated.
                if self.in_flight {
                    self.fail_turn(message);
                } else {
                    self.last_error = Some(message.clone());
                    let _ = self.error_tx.send(message);
                    self.publish();
                }
            }
            None => debug!("gateway payload not recognized by dispatcher; ignored"),
        }
    }

    /// Close the current turn as failed. Chat history, snapshot, and all
    /// completed messages stay intact.
    fn fail_turn(&mut self, message: String) {
        if let Some(pending) = self.pending_message_mut() {
            pending.mark_failed();
        }
        self.in_flight = false;
        self.last_error = Some(message.clone());
        let _ = self.error_tx.send(message);
        self.publish();
    }

    fn pending_message_mut(&mut self) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().rev().find(|m| m.is_pending())
    }

    fn publish(&self) {
        let _ = self.view_tx.send(SessionView {
            messages: Arc::new(self.messages.clone()),
            snapshot: self.snapshot.clone(),
            last_error: self.last_error.clone(),
            in_flight: self.in_flight,
        });
    }
}
