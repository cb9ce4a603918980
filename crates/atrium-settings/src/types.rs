//! Settings type definitions.
//!
//! Field names are camelCase on the wire to match the console's JSON
//! settings file. Every type implements [`Default`] with production values
//! and accepts partial JSON via `#[serde(default)]`.

use serde::{Deserialize, Serialize};

/// Root settings for the console's streaming core.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleSettings {
    /// REST/streaming API endpoint settings.
    pub api: ApiSettings,
    /// Persistent gateway connection settings.
    pub gateway: GatewaySettings,
}

/// Streaming chat endpoint settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base URL of the backend, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Path of the streaming chat endpoint.
    pub chat_path: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            chat_path: "/api/chat/stream".into(),
        }
    }
}

/// Persistent gateway connection settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewaySettings {
    /// WebSocket URL of the push gateway.
    pub url: String,
    /// Fixed retry ceiling for automatic reconnection.
    pub max_reconnect_attempts: u32,
    /// Fixed delay between reconnection attempts, in milliseconds.
    pub reconnect_interval_ms: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/ws".into(),
            max_reconnect_attempts: 5,
            reconnect_interval_ms: 3_000,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let settings = ConsoleSettings::default();
        assert!(settings.api.base_url.starts_with("http"));
        assert!(settings.gateway.url.starts_with("ws"));
        assert!(settings.gateway.max_reconnect_attempts > 0);
        assert!(settings.gateway.reconnect_interval_ms > 0);
    }

    #[test]
    fn partial_json_fills_missing_fields() {
        let settings: ConsoleSettings =
            serde_json::from_str(r#"{"gateway":{"maxReconnectAttempts":2}}"#).unwrap();
        assert_eq!(settings.gateway.max_reconnect_attempts, 2);
        assert_eq!(settings.api, ApiSettings::default());
        assert_eq!(
            settings.gateway.reconnect_interval_ms,
            GatewaySettings::default().reconnect_interval_ms
        );
    }

    #[test]
    fn wire_format_is_camel_case() {
        let json = serde_json::to_value(ConsoleSettings::default()).unwrap();
        assert!(json["api"]["baseUrl"].is_string());
        assert!(json["gateway"]["reconnectIntervalMs"].is_number());
    }
}
