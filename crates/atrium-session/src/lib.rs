//! # atrium-session
//!
//! Per-session state coordination for the Atrium console.
//!
//! A [`SessionCoordinator`] owns one conversation's state — chat history,
//! scene graph snapshot, last error, in-flight flag — behind a single
//! event-loop task. Stream events from the chat client and payloads from the
//! push gateway merge into that loop in arrival order, so state transitions
//! never interleave. Readers consume immutable [`SessionView`] snapshots via
//! a `watch` channel and error strings via a broadcast channel.

#![deny(unsafe_code)]

pub mod coordinator;
pub mod errors;
pub mod view;

pub use coordinator::{GatewayDispatcher, GatewayUpdate, SessionCoordinator};
pub use errors::CoordinatorError;
pub use view::SessionView;
