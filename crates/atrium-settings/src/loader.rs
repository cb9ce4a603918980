//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ConsoleSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply `ATRIUM_*` environment overrides (highest priority)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::ConsoleSettings;

/// Resolve the path to the settings file (`~/.atrium/settings.json`).
#[must_use]
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".atrium").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ConsoleSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; malformed JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ConsoleSettings> {
    let defaults = serde_json::to_value(ConsoleSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ConsoleSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
#[must_use]
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `ATRIUM_*` environment variable overrides.
fn apply_env_overrides(settings: &mut ConsoleSettings) {
    if let Some(v) = read_env_string("ATRIUM_API_BASE_URL") {
        settings.api.base_url = v;
    }
    if let Some(v) = read_env_string("ATRIUM_API_CHAT_PATH") {
        settings.api.chat_path = v;
    }
    if let Some(v) = read_env_string("ATRIUM_GATEWAY_URL") {
        settings.gateway.url = v;
    }
    if let Some(v) = read_env_u32("ATRIUM_GATEWAY_MAX_RECONNECT_ATTEMPTS") {
        settings.gateway.max_reconnect_attempts = v;
    }
    if let Some(v) = read_env_u64("ATRIUM_GATEWAY_RECONNECT_INTERVAL_MS") {
        settings.gateway.reconnect_interval_ms = v;
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u32(name: &str) -> Option<u32> {
    read_env_string(name)?.parse().ok()
}

fn read_env_u64(name: &str) -> Option<u64> {
    read_env_string(name)?.parse().ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
