//! Error types for heartbeat input validation.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("heartbeat file path is empty")]
    EmptyPath,

    #[error("heartbeat file path must be absolute: {0}")]
    RelativePath(String),

    #[error("unknown editor notification: {0}")]
    UnknownNotification(String),
}
