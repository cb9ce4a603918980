//! Streaming chat request client.
//!
//! Performs one request/response cycle against the streaming chat endpoint
//! and delivers decoded events to a caller-supplied handler as body
//! fragments arrive. The handler is invoked synchronously, in decode order,
//! and never after a terminal `done`/`error` event.

use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use atrium_auth::{AuthSignal, CredentialStore};
use atrium_core::StreamEvent;

use crate::decoder::FrameDecoder;
use crate::errors::ClientError;

/// Endpoint configuration for the streaming chat client.
#[derive(Clone, Debug)]
pub struct ChatClientConfig {
    /// Base URL of the backend, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Path of the streaming chat endpoint.
    pub chat_path: String,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            chat_path: "/api/chat/stream".into(),
        }
    }
}

/// Request body for one chat turn.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,
    /// Submitting user identifier.
    pub user: String,
    /// Target agent identifier.
    pub agent_id: String,
}

/// Client for one-shot streaming chat requests.
///
/// Holds explicit handles to the credential store and auth signal rather
/// than reaching for ambient globals; one instance can serve many cycles.
/// Running two cycles concurrently for the same logical session produces an
/// undefined merge order downstream — the session coordinator serializes
/// turns for that reason.
#[derive(Clone)]
pub struct ChatStreamClient {
    http: reqwest::Client,
    config: ChatClientConfig,
    credentials: CredentialStore,
    auth_signal: AuthSignal,
}

impl ChatStreamClient {
    /// Create a client with a fresh HTTP client.
    #[must_use]
    pub fn new(
        config: ChatClientConfig,
        credentials: CredentialStore,
        auth_signal: AuthSignal,
    ) -> Self {
        Self::with_client(reqwest::Client::new(), config, credentials, auth_signal)
    }

    /// Create a client sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(
        http: reqwest::Client,
        config: ChatClientConfig,
        credentials: CredentialStore,
        auth_signal: AuthSignal,
    ) -> Self {
        Self {
            http,
            config,
            credentials,
            auth_signal,
        }
    }

    /// Perform one streaming chat cycle.
    ///
    /// Preconditions: a live bearer credential must be present; otherwise
    /// the credentials-expired signal fires, no network call is made, and
    /// [`ClientError::Auth`] is returned. On a 401 response the same signal
    /// fires and the same error is returned with zero events delivered.
    ///
    /// On success the handler receives every decoded event in order until
    /// the stream's terminal `done`/`error` event, after which it is never
    /// invoked again. Malformed frames are logged and skipped without
    /// aborting the stream. Mid-stream transport failures surface as
    /// [`ClientError::Http`]; nothing is retried here.
    #[instrument(skip_all, fields(agent_id = %request.agent_id))]
    pub async fn send_chat<F>(
        &self,
        request: &ChatRequest,
        mut on_event: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(StreamEvent),
    {
        let Some(token) = self.credentials.bearer_token() else {
            warn!("no live bearer credential, skipping request");
            self.auth_signal.notify_expired();
            return Err(ClientError::Auth {
                message: "bearer credential missing or expired".into(),
            });
        };

        let url = format!("{}{}", self.config.base_url, self.config.chat_path);
        debug!(%url, user = %request.user, "sending streaming chat request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(ClientError::Http)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("chat request rejected with 401");
            self.auth_signal.notify_expired();
            return Err(ClientError::Auth {
                message: "credentials rejected by server".into(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_error_body(&body, status.as_u16());
            error!(status = status.as_u16(), %message, "chat request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut decoder = FrameDecoder::new();
        let mut body = response.bytes_stream();
        while let Some(fragment) = body.next().await {
            let fragment = fragment.map_err(ClientError::Http)?;
            for decoded in decoder.feed(&fragment) {
                match decoded {
                    Ok(event) => {
                        let terminal = event.is_terminal();
                        on_event(event);
                        if terminal {
                            debug!("stream terminated by done/error event");
                            return Ok(());
                        }
                    }
                    Err(e) => warn!(error = %e, "skipping malformed frame"),
                }
            }
        }

        debug!("response body ended without a terminal event");
        Ok(())
    }
}

/// Extract a human-readable message from a non-2xx error body.
///
/// The backend sends `{"detail": "..."}`; anything else falls back to a
/// generic message carrying the status code.
fn parse_error_body(body: &str, status: u16) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| format!("HTTP error {status}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
