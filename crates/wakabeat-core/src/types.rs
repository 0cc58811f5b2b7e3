use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::CoreError;

// ─── Editor notifications ─────────────────────────────────────────

/// Notification raised by an editor (or any other event source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorNotification {
    /// A document was opened.
    Open,
    /// A document was written to disk.
    Save,
    /// A document gained focus.
    Activate,
}

impl EditorNotification {
    pub const ALL: [Self; 3] = [Self::Open, Self::Save, Self::Activate];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Save => "save",
            Self::Activate => "activate",
        }
    }

    /// Saves are writes; everything else is a view.
    pub fn heartbeat_kind(self) -> HeartbeatKind {
        match self {
            Self::Save => HeartbeatKind::Write,
            Self::Open | Self::Activate => HeartbeatKind::View,
        }
    }
}

impl fmt::Display for EditorNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditorNotification {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "save" => Ok(Self::Save),
            "activate" => Ok(Self::Activate),
            _ => Err(CoreError::UnknownNotification(s.to_string())),
        }
    }
}

// ─── Heartbeat ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatKind {
    View,
    Write,
}

impl HeartbeatKind {
    pub fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}

/// A single activity observation for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    pub file_path: String,
    pub kind: HeartbeatKind,
    pub timestamp: DateTime<Utc>,
}

impl HeartbeatEvent {
    /// Build an event, rejecting empty and relative paths.
    pub fn new(
        file_path: impl Into<String>,
        kind: HeartbeatKind,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        let file_path = file_path.into();
        if file_path.trim().is_empty() {
            return Err(CoreError::EmptyPath);
        }
        if !Path::new(&file_path).is_absolute() {
            return Err(CoreError::RelativePath(file_path));
        }
        Ok(Self {
            file_path,
            kind,
            timestamp,
        })
    }

    pub fn from_notification(
        notification: EditorNotification,
        file_path: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        Self::new(file_path, notification.heartbeat_kind(), timestamp)
    }

    pub fn is_write(&self) -> bool {
        self.kind.is_write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid datetime")
    }

    #[test]
    fn save_maps_to_write() {
        assert_eq!(
            EditorNotification::Save.heartbeat_kind(),
            HeartbeatKind::Write
        );
        assert_eq!(
            EditorNotification::Open.heartbeat_kind(),
            HeartbeatKind::View
        );
        assert_eq!(
            EditorNotification::Activate.heartbeat_kind(),
            HeartbeatKind::View
        );
    }

    #[test]
    fn notification_from_str_case_insensitive() {
        for n in EditorNotification::ALL {
            let upper = n.as_str().to_ascii_uppercase();
            assert_eq!(upper.parse::<EditorNotification>(), Ok(n));
        }
        assert_eq!(
            "close".parse::<EditorNotification>(),
            Err(CoreError::UnknownNotification("close".to_string()))
        );
    }

    #[test]
    fn notification_serde_lowercase() {
        let json = serde_json::to_string(&EditorNotification::Activate).expect("serialize");
        assert_eq!(json, "\"activate\"");
    }

    #[test]
    fn event_rejects_empty_path() {
        let err = HeartbeatEvent::new("  ", HeartbeatKind::View, t0()).unwrap_err();
        assert_eq!(err, CoreError::EmptyPath);
    }

    #[cfg(unix)]
    #[test]
    fn event_rejects_relative_path() {
        let err = HeartbeatEvent::new("src/main.rs", HeartbeatKind::View, t0()).unwrap_err();
        assert_eq!(err, CoreError::RelativePath("src/main.rs".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn event_from_save_is_write() {
        let ev = HeartbeatEvent::from_notification(EditorNotification::Save, "/repo/a.rs", t0())
            .expect("valid event");
        assert!(ev.is_write());
        assert_eq!(ev.file_path, "/repo/a.rs");
        assert_eq!(ev.timestamp, t0());
    }
}
