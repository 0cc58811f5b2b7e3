//! HeartbeatLauncher trait and ProcessLauncher (detached subprocess spawn).

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::ToolError;

/// Upper bound on heartbeat processes running at the same time.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Starts a heartbeat process without waiting for it. Enables mock injection
/// for testing.
pub trait HeartbeatLauncher: Send + Sync {
    /// `Ok` means the process was started; its exit status is never reported.
    fn launch(&self, program: &Path, args: &[String]) -> Result<(), ToolError>;
}

impl<T: HeartbeatLauncher + ?Sized> HeartbeatLauncher for &T {
    fn launch(&self, program: &Path, args: &[String]) -> Result<(), ToolError> {
        (**self).launch(program, args)
    }
}

impl<T: HeartbeatLauncher + ?Sized> HeartbeatLauncher for Arc<T> {
    fn launch(&self, program: &Path, args: &[String]) -> Result<(), ToolError> {
        (**self).launch(program, args)
    }
}

/// Real launcher using `tokio::process::Command`.
///
/// stdio is detached. Each child is reaped on a background task which also
/// holds one of `max_in_flight` permits; launching with no permit left fails
/// with `ToolError::Saturated`. Must be called from within a tokio runtime.
pub struct ProcessLauncher {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl ProcessLauncher {
    pub fn new(max_in_flight: usize) -> Self {
        let limit = max_in_flight.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Heartbeat processes started and not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.limit - self.permits.available_permits()
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IN_FLIGHT)
    }
}

impl HeartbeatLauncher for ProcessLauncher {
    fn launch(&self, program: &Path, args: &[String]) -> Result<(), ToolError> {
        let permit = Arc::clone(&self.permits)
            .try_acquire_owned()
            .map_err(|_| ToolError::Saturated(self.limit))?;

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ToolError::Launch {
                program: program.to_path_buf(),
                source,
            })?;

        let program = program.display().to_string();
        tokio::spawn(async move {
            let _permit = permit;
            match child.wait().await {
                Ok(status) if status.success() => {
                    tracing::trace!(%program, "heartbeat process finished");
                }
                Ok(status) => {
                    tracing::debug!(%program, %status, "heartbeat process exited unsuccessfully");
                }
                Err(e) => {
                    tracing::debug!(%program, "failed to reap heartbeat process: {e}");
                }
            }
        });
        Ok(())
    }
}
