//! # atrium-gateway
//!
//! Persistent push connection for the Atrium console.
//!
//! A [`PersistentConnection`] owns one WebSocket connection to the backend
//! gateway and keeps it alive with a bounded-retry reconnection state
//! machine: a fixed attempt ceiling and a fixed inter-attempt delay, both
//! plain configuration values. After the ceiling is reached the connection
//! is [`ConnectionState::Failed`](atrium_core::ConnectionState) until an
//! explicit `connect()`.
//!
//! Lifecycle and message events fan out through a typed publish/subscribe
//! [`Emitter`]; dropping a subscriber's [`EventStream`] unsubscribes it.
//! `send` is fire-and-forget — payloads sent while not connected are
//! dropped, never queued.
//!
//! One instance is shared per application session; consumers subscribe
//! rather than own it.

#![deny(unsafe_code)]

pub mod connection;
pub mod emitter;

pub use connection::{GatewayConfig, PersistentConnection};
pub use emitter::{Emitter, EventStream, GatewayEvent};
