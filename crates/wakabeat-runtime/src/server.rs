//! UDS JSON-RPC server: the editor-facing event adapter.
//! Connection-per-request, newline-delimited JSON.
//!
//! Methods: `open` / `save` / `activate` (`{"path": ...}`), `status`, `provision`.

use std::os::unix::fs::PermissionsExt;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

use wakabeat_core::{EditorNotification, HeartbeatEvent};

use crate::service::ServiceHandle;

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const SERVER_ERROR: i64 = -32000;

/// Longest request line read from one connection.
const MAX_REQUEST_BYTES: u64 = 64 * 1024;

type RpcResult = Result<serde_json::Value, (i64, String)>;

/// Run the UDS JSON-RPC server.
pub async fn run_server(socket_path: &str, handle: ServiceHandle) -> anyhow::Result<()> {
    // Create socket directory with mode 0700
    let socket_dir = std::path::Path::new(socket_path)
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid socket path"))?;

    std::fs::create_dir_all(socket_dir)?;

    std::fs::set_permissions(socket_dir, std::fs::Permissions::from_mode(0o700))?;

    // Check for stale socket
    if std::path::Path::new(socket_path).exists() {
        if tokio::net::UnixStream::connect(socket_path).await.is_err() {
            std::fs::remove_file(socket_path)?;
            tracing::info!("removed stale socket at {socket_path}");
        } else {
            anyhow::bail!("another daemon is already running at {socket_path}");
        }
    }

    let listener = UnixListener::bind(socket_path)?;

    std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;

    tracing::info!("UDS server listening on {socket_path}");

    loop {
        let (stream, _) = listener.accept().await?;
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, handle).await {
                tracing::debug!("connection error: {e}");
            }
        });
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    handle: ServiceHandle,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader.take(MAX_REQUEST_BYTES));
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let response = match serde_json::from_str::<serde_json::Value>(line.trim()) {
        Ok(request) => {
            let id = request["id"].clone();
            let method = request["method"].as_str().unwrap_or("");
            build_response(id, route(&handle, method, &request["params"]).await)
        }
        Err(e) => build_response(
            serde_json::Value::Null,
            Err((PARSE_ERROR, format!("parse error: {e}"))),
        ),
    };

    let mut resp = serde_json::to_string(&response)?;
    resp.push('\n');
    writer.write_all(resp.as_bytes()).await?;

    Ok(())
}

async fn route(handle: &ServiceHandle, method: &str, params: &serde_json::Value) -> RpcResult {
    if let Ok(notification) = method.parse::<EditorNotification>() {
        return notify(handle, notification, params);
    }
    match method {
        "status" => {
            serde_json::to_value(handle.status()).map_err(|e| (SERVER_ERROR, e.to_string()))
        }
        "provision" => match handle.provisioner().provision().await {
            Ok(path) => Ok(serde_json::json!({ "path": path.display().to_string() })),
            Err(e) => Err((SERVER_ERROR, e.to_string())),
        },
        _ => Err((METHOD_NOT_FOUND, "method not found".to_string())),
    }
}

/// Turn an editor notification into a queued heartbeat event.
fn notify(
    handle: &ServiceHandle,
    notification: EditorNotification,
    params: &serde_json::Value,
) -> RpcResult {
    let event = notification_event(notification, params)?;
    tracing::debug!(entity = %event.file_path, %notification, "notification received");
    handle
        .enqueue(event)
        .map_err(|e| (SERVER_ERROR, e.to_string()))?;
    Ok(serde_json::json!({ "queued": true }))
}

pub(crate) fn notification_event(
    notification: EditorNotification,
    params: &serde_json::Value,
) -> Result<HeartbeatEvent, (i64, String)> {
    let path = params["path"]
        .as_str()
        .ok_or_else(|| (INVALID_PARAMS, "missing params.path".to_string()))?;
    HeartbeatEvent::from_notification(notification, path, Utc::now())
        .map_err(|e| (INVALID_PARAMS, e.to_string()))
}

fn build_response(id: serde_json::Value, result: RpcResult) -> serde_json::Value {
    match result {
        Ok(result) => serde_json::json!({
            "jsonrpc": "2.0",
            "result": result,
            "id": id,
        }),
        Err((code, message)) => serde_json::json!({
            "jsonrpc": "2.0",
            "error": {"code": code, "message": message},
            "id": id,
        }),
    }
}
