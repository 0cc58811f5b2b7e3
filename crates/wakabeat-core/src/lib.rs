//! wakabeat-core: pure heartbeat logic.
//! Event model, view/write throttling, and project detection.
//! No IO beyond read-only directory probes in `project`.

pub mod config;
pub mod error;
pub mod project;
pub mod throttle;
pub mod types;

pub use config::HeartbeatConfig;
pub use error::CoreError;
pub use project::{find_project_root, resolve_project};
pub use throttle::{HeartbeatThrottle, SendReason, ThrottleDecision, ThrottleState};
pub use types::{EditorNotification, HeartbeatEvent, HeartbeatKind};
