//! Bearer credential storage and expiry checks.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Margin subtracted from the expiry time when checking liveness.
///
/// A token within this window of expiring is treated as expired so a
/// request does not race the server-side cutoff.
const EXPIRY_MARGIN_MS: u64 = 30_000;

/// Current time in milliseconds since the Unix epoch.
#[allow(clippy::cast_possible_truncation)] // u128→u64 holds for any realistic clock
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A bearer token with its expiry time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerCredential {
    /// The access token placed in the `Authorization` header.
    pub access_token: String,
    /// Expiry time in milliseconds since the Unix epoch. `0` means no expiry.
    pub expires_at: u64,
}

impl BearerCredential {
    /// Whether the credential is expired (or within the expiry margin) at
    /// the given time.
    #[must_use]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at != 0 && now + EXPIRY_MARGIN_MS >= self.expires_at
    }
}

/// Shared store for the session's bearer credential.
///
/// Clones share the same underlying slot; the auth collaborator writes,
/// the streaming client reads.
#[derive(Clone, Default)]
pub struct CredentialStore {
    inner: Arc<RwLock<Option<BearerCredential>>>,
}

impl CredentialStore {
    /// An empty store with no credential.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored credential.
    pub fn set(&self, credential: BearerCredential) {
        *self.inner.write() = Some(credential);
    }

    /// Remove the stored credential.
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// The stored credential, expired or not.
    #[must_use]
    pub fn current(&self) -> Option<BearerCredential> {
        self.inner.read().clone()
    }

    /// The access token, only if a credential is present and not expired.
    #[must_use]
    pub fn bearer_token(&self) -> Option<String> {
        let guard = self.inner.read();
        let credential = guard.as_ref()?;
        if credential.is_expired(now_ms()) {
            return None;
        }
        Some(credential.access_token.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
