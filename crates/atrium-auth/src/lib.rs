//! # atrium-auth
//!
//! Bearer credential handling for the Atrium console core.
//!
//! Two pieces:
//!
//! - [`CredentialStore`]: a cheaply cloneable shared store holding the
//!   current [`BearerCredential`]. Expiry is checked with a small margin so
//!   a token about to lapse is treated as already expired.
//! - [`AuthSignal`]: an explicit, constructed broadcast fired when a request
//!   returns 401 or a locally held credential is found expired before a
//!   request is attempted. The auth collaborator subscribes to it to trigger
//!   re-authentication. One instance per application context, passed by
//!   reference — never a module-level singleton.

#![deny(unsafe_code)]

pub mod credentials;
pub mod signal;

pub use credentials::{BearerCredential, CredentialStore, now_ms};
pub use signal::{AuthEvent, AuthSignal};
