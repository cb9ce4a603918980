//! End-to-end coordinator tests against a mock streaming backend.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use atrium_auth::{AuthSignal, BearerCredential, CredentialStore};
use atrium_client::{ChatClientConfig, ChatStreamClient};
use atrium_core::{AgentId, MessageStatus, Role};
use atrium_gateway::{Emitter, GatewayEvent};
use atrium_session::{
    CoordinatorError, GatewayUpdate, SessionCoordinator, SessionView,
};

const TIMEOUT: Duration = Duration::from_secs(5);
const CHAT_PATH: &str = "/api/chat/stream";

fn frame(event: serde_json::Value) -> String {
    format!("data: {event}\n\n")
}

fn client_for(server: &MockServer) -> ChatStreamClient {
    let credentials = CredentialStore::new();
    credentials.set(BearerCredential {
        access_token: "tok_live".into(),
        expires_at: 0,
    });
    ChatStreamClient::new(
        ChatClientConfig {
            base_url: server.uri(),
            chat_path: CHAT_PATH.into(),
        },
        credentials,
        AuthSignal::new(),
    )
}

fn coordinator_for(server: &MockServer) -> SessionCoordinator {
    SessionCoordinator::new(client_for(server), AgentId::from("agent_1"), "admin")
}

/// Wait until the published view satisfies `predicate`.
async fn wait_for_view<F>(coordinator: &SessionCoordinator, predicate: F) -> SessionView
where
    F: Fn(&SessionView) -> bool,
{
    let mut rx = coordinator.watch_view();
    timeout(TIMEOUT, async {
        loop {
            {
                let view = rx.borrow_and_update();
                if predicate(&view) {
                    return SessionView::clone(&view);
                }
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("timed out waiting for view")
}

async fn mock_stream(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw(body, "text/event-stream"),
        )
        .mount(server)
        .await;
}

// ── Chat turn lifecycle ──────────────────────────────────────────────────

#[tokio::test]
async fn submit_streams_a_complete_turn_into_the_view() {
    let server = MockServer::start().await;
    let body = [
        frame(json!({"type": "token", "value": "He"})),
        frame(json!({"type": "token", "value": "llo"})),
        frame(json!({"type": "reason", "value": "greeting detected"})),
        frame(json!({"type": "done"})),
    ]
    .concat();
    mock_stream(&server, body).await;

    let coordinator = coordinator_for(&server);
    coordinator.submit("hi there").await.unwrap();

    // Optimistic state is visible before the stream finishes.
    let optimistic = wait_for_view(&coordinator, |v| v.messages.len() == 2).await;
    assert!(optimistic.in_flight);
    assert_eq!(optimistic.messages[0].role, Role::User);
    assert_eq!(optimistic.messages[0].text, "hi there");
    assert_eq!(optimistic.messages[0].status, MessageStatus::Complete);
    assert_eq!(optimistic.messages[1].role, Role::Agent);

    let done = wait_for_view(&coordinator, |v| !v.in_flight).await;
    let agent = &done.messages[1];
    assert_eq!(agent.status, MessageStatus::Complete);
    assert_eq!(agent.text, "Hello");
    assert_eq!(agent.reasoning.as_deref(), Some("greeting detected"));
    assert!(done.last_error.is_none());
}

#[tokio::test]
async fn second_submit_while_in_flight_is_rejected_busy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_raw(frame(json!({"type": "done"})), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    coordinator.submit("first").await.unwrap();
    assert_eq!(
        coordinator.submit("second").await,
        Err(CoordinatorError::Busy)
    );

    // Once the first turn completes, submissions are accepted again.
    let _ = wait_for_view(&coordinator, |v| !v.in_flight).await;
    coordinator.submit("third").await.unwrap();
}

#[tokio::test]
async fn stream_error_fails_the_pending_message_and_keeps_history() {
    let server = MockServer::start().await;
    let body = [
        frame(json!({"type": "token", "value": "partial"})),
        frame(json!({"type": "error", "message": "agent crashed"})),
    ]
    .concat();
    mock_stream(&server, body).await;

    let coordinator = coordinator_for(&server);
    let mut errors = coordinator.errors();
    coordinator.submit("hello?").await.unwrap();

    let view = wait_for_view(&coordinator, |v| !v.in_flight && v.last_error.is_some()).await;
    assert_eq!(view.last_error.as_deref(), Some("agent crashed"));

    // History survives: the user message and the partial agent text stay.
    assert_eq!(view.messages.len(), 2);
    assert_eq!(view.messages[1].status, MessageStatus::Failed);
    assert_eq!(view.messages[1].text, "partial");

    let published = timeout(TIMEOUT, errors.recv()).await.unwrap().unwrap();
    assert_eq!(published, "agent crashed");
}

#[tokio::test]
async fn rejected_request_fails_the_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    coordinator.submit("hi").await.unwrap();

    let view = wait_for_view(&coordinator, |v| !v.in_flight && v.last_error.is_some()).await;
    assert_eq!(view.messages[1].status, MessageStatus::Failed);
    assert!(view.messages[1].text.is_empty());
}

#[tokio::test]
async fn api_error_detail_becomes_the_user_visible_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"detail": "agent offline"})),
        )
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    coordinator.submit("hi").await.unwrap();

    let view = wait_for_view(&coordinator, |v| v.last_error.is_some()).await;
    assert!(
        view.last_error.as_deref().unwrap().contains("agent offline"),
        "unexpected error: {:?}",
        view.last_error
    );
}

#[tokio::test]
async fn graph_events_replace_the_snapshot_wholesale() {
    let server = MockServer::start().await;
    let body = [
        frame(json!({"type": "graph", "graph": {"nodes": [1], "label": "first"}})),
        frame(json!({"type": "graph", "graph": {"nodes": [1, 2]}})),
        frame(json!({"type": "done"})),
    ]
    .concat();
    mock_stream(&server, body).await;

    let coordinator = coordinator_for(&server);
    coordinator.submit("draw").await.unwrap();

    let view = wait_for_view(&coordinator, |v| !v.in_flight && v.snapshot.is_some()).await;
    let graph = view.snapshot.unwrap();
    // Replacement, not merge: the first snapshot's extra key is gone.
    assert_eq!(graph.as_value()["nodes"], json!([1, 2]));
    assert!(graph.as_value().get("label").is_none());
}

#[tokio::test]
async fn clear_history_empties_messages_but_keeps_the_snapshot() {
    let server = MockServer::start().await;
    let body = [
        frame(json!({"type": "graph", "graph": {"nodes": []}})),
        frame(json!({"type": "token", "value": "ok"})),
        frame(json!({"type": "done"})),
    ]
    .concat();
    mock_stream(&server, body).await;

    let coordinator = coordinator_for(&server);
    coordinator.submit("hi").await.unwrap();
    let _ = wait_for_view(&coordinator, |v| !v.in_flight).await;

    coordinator.clear_history().unwrap();
    let view = wait_for_view(&coordinator, |v| v.messages.is_empty()).await;
    assert!(view.snapshot.is_some());
}

// ── Gateway integration ──────────────────────────────────────────────────

#[tokio::test]
async fn default_dispatcher_ignores_gateway_payloads() {
    let server = MockServer::start().await;
    let coordinator = coordinator_for(&server);

    let emitter = Emitter::new();
    coordinator.attach_gateway_stream(emitter.subscribe());
    emitter.emit(&GatewayEvent::Message(json!({"kind": "graph", "graph": {}})));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let view = coordinator.view();
    assert!(view.snapshot.is_none());
    assert!(view.last_error.is_none());
}

#[tokio::test]
async fn dispatcher_routes_gateway_graphs_and_errors() {
    let server = MockServer::start().await;
    let coordinator = SessionCoordinator::with_dispatcher(
        client_for(&server),
        AgentId::from("agent_1"),
        "admin",
        Arc::new(|payload| match payload["kind"].as_str() {
            Some("graph") => Some(GatewayUpdate::Graph(payload["graph"].clone())),
            Some("error") => Some(GatewayUpdate::Error(
                payload["message"].as_str().unwrap_or("gateway error").to_string(),
            )),
            _ => None,
        }),
    );
    let mut errors = coordinator.errors();

    let emitter = Emitter::new();
    coordinator.attach_gateway_stream(emitter.subscribe());

    emitter.emit(&GatewayEvent::Message(
        json!({"kind": "graph", "graph": {"nodes": [7]}}),
    ));
    let view = wait_for_view(&coordinator, |v| v.snapshot.is_some()).await;
    assert_eq!(view.snapshot.unwrap().as_value()["nodes"], json!([7]));

    emitter.emit(&GatewayEvent::Message(
        json!({"kind": "error", "message": "backend degraded"}),
    ));
    let view = wait_for_view(&coordinator, |v| v.last_error.is_some()).await;
    assert_eq!(view.last_error.as_deref(), Some("backend degraded"));
    let published = timeout(TIMEOUT, errors.recv()).await.unwrap().unwrap();
    assert_eq!(published, "backend degraded");

    // Gateway errors do not disturb the chat history.
    assert!(view.messages.is_empty());
}

#[tokio::test]
async fn gateway_error_fails_the_in_flight_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_raw(frame(json!({"type": "done"})), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let coordinator = SessionCoordinator::with_dispatcher(
        client_for(&server),
        AgentId::from("agent_1"),
        "admin",
        Arc::new(|payload| {
            payload["message"]
                .as_str()
                .map(|m| GatewayUpdate::Error(m.to_string()))
        }),
    );
    let mut errors = coordinator.errors();

    let emitter = Emitter::new();
    coordinator.attach_gateway_stream(emitter.subscribe());

    coordinator.submit("hi").await.unwrap();
    let _ = wait_for_view(&coordinator, |v| v.in_flight).await;

    // An error from the push channel fails the open turn like a stream
    // error would.
    emitter.emit(&GatewayEvent::Message(json!({"message": "session evicted"})));
    let view = wait_for_view(&coordinator, |v| !v.in_flight).await;
    assert_eq!(view.messages[1].status, MessageStatus::Failed);
    assert_eq!(view.last_error.as_deref(), Some("session evicted"));
    let published = timeout(TIMEOUT, errors.recv()).await.unwrap().unwrap();
    assert_eq!(published, "session evicted");

    // The delayed stream's `done` must not resurrect the failed turn.
    tokio::time::sleep(Duration::from_millis(700)).await;
    let view = coordinator.view();
    assert_eq!(view.messages[1].status, MessageStatus::Failed);
    assert!(!view.in_flight);
}

#[tokio::test]
async fn non_message_gateway_events_are_ignored() {
    let server = MockServer::start().await;
    let coordinator = SessionCoordinator::with_dispatcher(
        client_for(&server),
        AgentId::from("agent_1"),
        "admin",
        Arc::new(|payload| Some(GatewayUpdate::Graph(payload.clone()))),
    );

    let emitter = Emitter::new();
    coordinator.attach_gateway_stream(emitter.subscribe());
    emitter.emit(&GatewayEvent::Connected);
    emitter.emit(&GatewayEvent::Error("transient".into()));
    emitter.emit(&GatewayEvent::Disconnected);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let view = coordinator.view();
    assert!(view.snapshot.is_none());
    assert!(view.last_error.is_none());
}
