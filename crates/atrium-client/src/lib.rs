//! # atrium-client
//!
//! Streaming chat request client for the Atrium console.
//!
//! Two pieces:
//!
//! - [`FrameDecoder`]: turns arbitrarily chunked text fragments into ordered
//!   [`StreamEvent`](atrium_core::StreamEvent)s. Pure buffering and parsing,
//!   no I/O.
//! - [`ChatStreamClient`]: performs one streaming request/response cycle —
//!   bearer auth precondition, POST, incremental body reads — and delivers
//!   each decoded event to a caller-supplied handler as it arrives.
//!
//! The client never retries: a failed chat turn is re-initiated by the
//! caller. Decode errors are recovered locally (the bad frame is skipped);
//! authorization and HTTP errors always surface.

#![deny(unsafe_code)]

pub mod client;
pub mod decoder;
pub mod errors;

pub use client::{ChatClientConfig, ChatRequest, ChatStreamClient};
pub use decoder::{DecodeError, FrameDecoder};
pub use errors::ClientError;
