//! Daemon wiring: heartbeat service + UDS server + signal handling.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use wakabeat_core::{EditorNotification, HeartbeatEvent};
use wakabeat_tool::{ProcessLauncher, Provisioner};

use crate::cli::DaemonOpts;
use crate::server;
use crate::service::{HeartbeatService, ServiceHandle, spawn_service};

/// Time allowed for the consumer to drain queued events on shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run_daemon(opts: DaemonOpts, socket_path: &str) -> anyhow::Result<()> {
    let paths = opts.tool_paths()?;
    let heartbeat_config = opts.heartbeat_config();
    let provision_config = opts.provision_config();

    tracing::info!(
        home = %paths.home().display(),
        cooldown_secs = heartbeat_config.cooldown_secs,
        cli_version = %provision_config.cli_version,
        auto_download = provision_config.auto_download,
        max_in_flight = opts.max_in_flight,
        plugin = %heartbeat_config.plugin_identity(),
        "daemon configuration"
    );

    let provisioner = Arc::new(Provisioner::new(paths, provision_config)?);
    let launcher = ProcessLauncher::new(opts.max_in_flight);
    let service = HeartbeatService::new(&heartbeat_config, provisioner, launcher);
    let (handle, mut service_task) = spawn_service(service);

    if let Some(current) = &opts.current {
        enqueue_current(&handle, current);
    }

    // Start UDS server
    let server_handle = handle.clone();
    let server_socket = socket_path.to_string();
    let mut server_task = tokio::spawn(async move {
        if let Err(e) = server::run_server(&server_socket, server_handle).await {
            tracing::error!("UDS server error: {e}");
        }
    });

    // Wait for shutdown signal (ctrl-c or SIGTERM)
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
        Ok::<(), std::io::Error>(())
    };

    tokio::select! {
        res = shutdown => res?,
        _ = &mut server_task => {
            tracing::warn!("server exited unexpectedly");
        }
        _ = &mut service_task => {
            tracing::warn!("heartbeat service exited unexpectedly");
        }
    }

    if !server_task.is_finished() {
        server_task.abort();
        let _ = server_task.await;
    }

    // Dropping the last sender lets the consumer drain and stop.
    drop(handle);
    if !service_task.is_finished()
        && tokio::time::timeout(DRAIN_TIMEOUT, &mut service_task)
            .await
            .is_err()
    {
        tracing::warn!("heartbeat queue not drained within {DRAIN_TIMEOUT:?}");
        service_task.abort();
    }

    // Cleanup socket
    let _ = std::fs::remove_file(socket_path);
    tracing::info!("daemon stopped");
    Ok(())
}

/// Report the file already open at startup as a view.
fn enqueue_current(handle: &ServiceHandle, current: &std::path::Path) {
    let path = match std::path::absolute(current) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("cannot resolve --current {}: {e}", current.display());
            return;
        }
    };
    match HeartbeatEvent::from_notification(
        EditorNotification::Activate,
        path.to_string_lossy(),
        Utc::now(),
    ) {
        Ok(event) => {
            if let Err(e) = handle.enqueue(event) {
                tracing::warn!("startup heartbeat dropped: {e}");
            }
        }
        Err(e) => tracing::warn!("startup heartbeat rejected: {e}"),
    }
}
