//! # atrium-settings
//!
//! Configuration for the Atrium console's streaming core.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`ConsoleSettings::default()`]
//! 2. **User file** — `~/.atrium/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `ATRIUM_*` overrides (highest priority)
//!
//! Missing files fall back to defaults; malformed JSON is an error.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{ApiSettings, ConsoleSettings, GatewaySettings};
