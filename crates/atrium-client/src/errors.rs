//! Client error types.

use thiserror::Error;

/// Errors that can occur during a streaming chat request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level HTTP failure (connect, read, mid-stream drop).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credential missing, expired, or rejected by the server (401).
    #[error("authorization error: {message}")]
    Auth {
        /// Error description.
        message: String,
    },

    /// Non-2xx response other than 401.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message from the error body, or a generic fallback.
        message: String,
    },
}

impl ClientError {
    /// Whether this error should trigger re-authentication.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
