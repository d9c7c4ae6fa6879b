//! Single-file actions: connection test, file check, file send, settings write

use pd_core::time::format_unix_secs;
use pd_core::validate::validate_path;
use pd_core::{shell_quote, ExecOutput, QueueLayout, RelayError, Transport};
use pd_protocol::Response;

use crate::remote::RemoteClient;

/// Confirm the endpoint accepts a batch-mode login
pub async fn test_conn<T: Transport + ?Sized>(
    client: &RemoteClient<'_, T>,
) -> Result<Response, RelayError> {
    tracing::info!("Testing connection to {}", client.target());

    client.exec_checked("echo ok", "Connection failed").await?;

    // Second call rides the multiplexed channel opened by the first
    let hostname = match client.exec("hostname").await {
        Ok(output) if output.success() && !output.stdout.trim().is_empty() => {
            output.stdout.trim().to_string()
        }
        _ => client.target().to_string(),
    };

    Ok(Response::success().with_message(format!(
        "Connected to {} ({})",
        client.target(),
        hostname
    )))
}

/// Report whether a remote file exists, with its size and mtime
pub async fn check_file<T: Transport + ?Sized>(
    client: &RemoteClient<'_, T>,
    remote_path: &str,
) -> Result<Response, RelayError> {
    let path = shell_quote(validate_path(remote_path)?);
    tracing::info!("Checking file {} on {}", remote_path, client.target());

    // GNU stat first, BSD stat (macOS) as fallback
    let command = format!(
        "stat -c '%s %Y' {path} 2>/dev/null || stat -f '%z %m' {path} 2>/dev/null",
        path = path
    );
    let output = client.exec(&command).await?;

    if output.transport_failed() {
        return Err(RelayError::Remote(output.error_text("Connection failed")));
    }

    Ok(Response::success().with_file_info(parse_stat(&output)))
}

/// Parse `<size> <mtime>` printed by either stat flavour
fn parse_stat(output: &ExecOutput) -> Option<(u64, String)> {
    if !output.success() {
        return None;
    }

    let mut parts = output.stdout.split_whitespace();
    let size = parts.next()?.parse().ok()?;
    let mtime: i64 = parts.next()?.parse().ok()?;
    Some((size, format_unix_secs(mtime)?))
}

/// Write `content` to a remote path, creating its directory first.
///
/// The file is always replaced; `overwrite` is only logged.
pub async fn send_file<T: Transport + ?Sized>(
    client: &RemoteClient<'_, T>,
    remote_path: &str,
    content: &str,
    overwrite: bool,
) -> Result<Response, RelayError> {
    let remote_path = validate_path(remote_path)?;
    tracing::info!(
        "Sending file to {}:{} (overwrite={})",
        client.target(),
        remote_path,
        overwrite
    );

    if let Some(dir) = parent_dir(remote_path) {
        client
            .make_dirs([dir], "Failed to create directory")
            .await
            .map_err(|e| match e {
                RelayError::Remote(msg) => {
                    RelayError::Remote(format!("Cannot create directory: {}", msg))
                }
                other => other,
            })?;
    }

    client
        .upload(content.as_bytes(), remote_path, "SCP failed")
        .await?;

    tracing::info!("Successfully sent to {}:{}", client.target(), remote_path);
    Ok(Response::success().with_message(format!(
        "Sent to {}:{}",
        client.target(),
        remote_path
    )))
}

/// Directory part of a remote path, if it has one
fn parent_dir(path: &str) -> Option<&str> {
    let (dir, _) = path.rsplit_once('/')?;
    if dir.is_empty() {
        Some("/")
    } else {
        Some(dir)
    }
}

/// Write the agent permission settings to `<project>/.claude/settings.json`
pub async fn write_settings<T: Transport + ?Sized>(
    client: &RemoteClient<'_, T>,
    layout: &QueueLayout,
    settings_json: &str,
) -> Result<Response, RelayError> {
    serde_json::from_str::<serde_json::Value>(settings_json)
        .map_err(|e| RelayError::InvalidPayload(format!("Invalid settings JSON: {}", e)))?;

    tracing::info!(
        "Writing settings.json to {}:{}",
        client.target(),
        layout.settings_dir()
    );

    client
        .make_dirs([layout.settings_dir()], "Failed to create .claude directory")
        .await?;
    client
        .upload(settings_json.as_bytes(), &layout.settings_file(), "SCP failed")
        .await?;

    tracing::info!("Settings written to {}:{}", client.target(), layout.settings_file());
    Ok(Response::success().with_message("Settings written"))
}
