//! Coordinator error types.

use thiserror::Error;

/// Errors surfaced by [`SessionCoordinator`](crate::SessionCoordinator)
/// operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    /// A chat turn is already in flight; at most one runs per session.
    #[error("a chat turn is already in flight")]
    Busy,

    /// The coordinator's event loop has shut down.
    #[error("session coordinator is closed")]
    Closed,
}

/// Convenience result alias for coordinator operations.
pub type Result<T> = std::result::Result<T, CoordinatorError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
