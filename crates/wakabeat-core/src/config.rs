//! Heartbeat policy constants and the plugin identity string.

use chrono::TimeDelta;

/// Minimum spacing between two View heartbeats on the same file (seconds).
pub const DEFAULT_COOLDOWN_SECS: u64 = 120;

/// Name reported to `wakatime-cli` via `--plugin`.
pub const PLUGIN_NAME: &str = "wakabeat";

/// Version reported to `wakatime-cli` via `--plugin`.
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Throttle window for repeated View events on one file.
    pub cooldown_secs: u64,
    /// Optional `name/version` of the editor feeding events, e.g. `geany/2.0`.
    pub editor: Option<String>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            editor: None,
        }
    }
}

impl HeartbeatConfig {
    pub fn cooldown(&self) -> TimeDelta {
        i64::try_from(self.cooldown_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// `[editor ]wakabeat/<version>`, the value passed to `--plugin`.
    pub fn plugin_identity(&self) -> String {
        let own = format!("{PLUGIN_NAME}/{PLUGIN_VERSION}");
        match self.editor.as_deref().map(str::trim) {
            Some(editor) if !editor.is_empty() => format!("{editor} {own}"),
            _ => own,
        }
    }
}
