//! Heartbeat dispatch: build the wakatime-cli argument list and launch it.

use std::path::Path;

use wakabeat_core::HeartbeatEvent;

use crate::launcher::HeartbeatLauncher;

/// `--entity <path> --plugin <identity> [--project <name>] [--write]`
pub fn build_args(event: &HeartbeatEvent, plugin: &str, project: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "--entity".to_string(),
        event.file_path.clone(),
        "--plugin".to_string(),
        plugin.to_string(),
    ];
    if let Some(project) = project {
        args.push("--project".to_string());
        args.push(project.to_string());
    }
    if event.is_write() {
        args.push("--write".to_string());
    }
    args
}

/// Launch one heartbeat. Returns whether the process started.
///
/// Launch errors are logged here and never propagated.
pub fn dispatch<L: HeartbeatLauncher + ?Sized>(
    launcher: &L,
    cli: &Path,
    event: &HeartbeatEvent,
    plugin: &str,
    project: Option<&str>,
) -> bool {
    let args = build_args(event, plugin, project);
    match launcher.launch(cli, &args) {
        Ok(()) => {
            tracing::debug!(
                entity = %event.file_path,
                project = project.unwrap_or("-"),
                write = event.is_write(),
                "heartbeat launched"
            );
            true
        }
        Err(e) => {
            tracing::warn!(entity = %event.file_path, "failed to launch wakatime-cli: {e}");
            false
        }
    }
}
