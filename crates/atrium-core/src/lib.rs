//! # atrium-core
//!
//! Foundation types for the Atrium console's streaming communication core.
//!
//! This crate provides the shared vocabulary the other Atrium crates depend on:
//!
//! - **Stream events**: [`StreamEvent`] — the tagged events decoded from a
//!   streaming chat response (`token`, `reason`, `graph`, `done`, `error`)
//! - **Chat messages**: [`ChatMessage`] with an explicit [`MessageStatus`]
//!   (`Pending` / `Complete` / `Failed`) instead of inferred in-flight flags
//! - **Connection state**: [`ConnectionState`] for the persistent gateway
//!   connection's reconnection state machine
//! - **Scene graph**: [`SceneGraphSnapshot`], an opaque last-write-wins value
//! - **Branded IDs**: [`MessageId`], [`AgentId`] newtypes for type safety

#![deny(unsafe_code)]

pub mod connection;
pub mod events;
pub mod ids;
pub mod messages;
pub mod snapshot;

pub use connection::ConnectionState;
pub use events::StreamEvent;
pub use ids::{AgentId, MessageId};
pub use messages::{ChatMessage, MessageStatus, Role};
pub use snapshot::SceneGraphSnapshot;
