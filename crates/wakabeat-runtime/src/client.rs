//! UDS JSON-RPC client for CLI subcommands.

use std::path::Path;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use wakabeat_core::EditorNotification;

pub(crate) async fn rpc_call(
    socket_path: &str,
    method: &str,
    params: serde_json::Value,
) -> anyhow::Result<serde_json::Value> {
    let stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot connect to daemon at {socket_path}: {e}"))?;

    let (reader, mut writer) = stream.into_split();

    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1,
    });
    let mut req = serde_json::to_string(&request)?;
    req.push('\n');
    writer.write_all(req.as_bytes()).await?;
    writer.shutdown().await?;

    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let response: serde_json::Value = serde_json::from_str(line.trim())?;

    if let Some(error) = response.get("error") {
        anyhow::bail!("RPC error: {error}");
    }

    Ok(response["result"].clone())
}

/// Params for `open` / `save` / `activate`. Relative paths are resolved
/// against the caller's working directory, since the daemon has its own.
pub(crate) fn notify_params(path: &Path) -> anyhow::Result<serde_json::Value> {
    let absolute = std::path::absolute(path)
        .map_err(|e| anyhow::anyhow!("cannot resolve {}: {e}", path.display()))?;
    Ok(serde_json::json!({ "path": absolute.to_string_lossy() }))
}

/// `wakabeat open|save|activate <path>`: silent on success.
pub async fn cmd_notify(
    socket_path: &str,
    notification: EditorNotification,
    path: &Path,
) -> anyhow::Result<()> {
    let params = notify_params(path)?;
    rpc_call(socket_path, notification.as_str(), params).await?;
    Ok(())
}

/// `wakabeat status`
pub async fn cmd_status(socket_path: &str) -> anyhow::Result<()> {
    let status = rpc_call(socket_path, "status", serde_json::json!({})).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

/// `wakabeat provision`
pub async fn cmd_provision(socket_path: &str) -> anyhow::Result<()> {
    let result = rpc_call(socket_path, "provision", serde_json::json!({})).await?;
    match result["path"].as_str() {
        Some(path) => println!("{path}"),
        None => anyhow::bail!("unexpected provision response: {result}"),
    }
    Ok(())
}
