//! Error types for the wakatime-cli boundary.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("wakatime-cli not found and could not be provisioned")]
    MissingDependency,

    #[error("wakatime-cli download already in progress")]
    DownloadInProgress,

    #[error("wakatime credentials not found at {}", .0.display())]
    MissingCredentials(PathBuf),

    #[error("download of {url} failed with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("download transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to launch {}: {source}", .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("too many heartbeat processes in flight (limit {0})")]
    Saturated(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
