//! Transport abstraction and the ssh/scp subprocess implementation
//!
//! The relay never speaks the secure-shell protocol itself. Each call spawns
//! the external executable, waits for it under a timeout, and hands back
//! whatever it printed. A timed-out child is dropped, which kills it.

use std::io::{ErrorKind, Write};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::TransportError;
use crate::ssh::{Remote, SshOptions, Tool};

/// Exit status ssh reserves for its own failures (connect, auth, host key)
pub const TRANSPORT_FAILURE_STATUS: i32 = 255;

/// Captured result of one transport invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit code, `None` if terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    /// Successful exit with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed exit with the given code and stderr
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Whether the transport itself failed, as opposed to the remote command
    pub fn transport_failed(&self) -> bool {
        self.status == Some(TRANSPORT_FAILURE_STATUS)
    }

    /// Trimmed stderr, or `fallback` when stderr is blank
    pub fn error_text(&self, fallback: &str) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            fallback.to_string()
        } else {
            stderr.to_string()
        }
    }

    /// Human-readable exit status
    pub fn exit_description(&self) -> String {
        match self.status {
            Some(code) => format!("Exit code: {}", code),
            None => "Terminated by signal".to_string(),
        }
    }
}

/// Abstraction over the remote-execute and remote-copy operations
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run `command` through the remote shell
    async fn exec(
        &self,
        remote: &Remote,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, TransportError>;

    /// Write `contents` to `destination` on the remote host
    async fn upload(
        &self,
        remote: &Remote,
        contents: &[u8],
        destination: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, TransportError>;
}

/// Transport backed by the system `ssh` and `scp` executables
#[derive(Debug, Clone)]
pub struct SshTransport {
    options: SshOptions,
    ssh_program: String,
    scp_program: String,
}

impl SshTransport {
    /// Create a transport using the given options and executables
    pub fn new(
        options: SshOptions,
        ssh_program: impl Into<String>,
        scp_program: impl Into<String>,
    ) -> Self {
        Self {
            options,
            ssh_program: ssh_program.into(),
            scp_program: scp_program.into(),
        }
    }

    async fn run(
        &self,
        tool: Tool,
        args: Vec<String>,
        timeout: Duration,
    ) -> Result<ExecOutput, TransportError> {
        let program = match tool {
            Tool::Ssh => &self.ssh_program,
            Tool::Scp => &self.scp_program,
        };

        tracing::debug!("Running: {} {}", program, args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(&args)
            // stdin carries the native messaging stream; the child must not read it
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => TransportError::NotFound(tool),
            _ => TransportError::Io(e),
        })?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| TransportError::TimedOut(timeout))??;

        Ok(ExecOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new(SshOptions::default(), "ssh", "scp")
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn exec(
        &self,
        remote: &Remote,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, TransportError> {
        let mut args = self.options.args(remote, Tool::Ssh);
        args.push(remote.target().to_string());
        args.push(command.to_string());

        self.run(Tool::Ssh, args, timeout).await
    }

    async fn upload(
        &self,
        remote: &Remote,
        contents: &[u8],
        destination: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, TransportError> {
        // Staged locally and removed when `staged` drops
        let mut staged = tempfile::Builder::new().prefix("plandrop_").tempfile()?;
        staged.write_all(contents)?;
        staged.flush()?;
        tracing::debug!(
            "Wrote {} bytes to {}",
            contents.len(),
            staged.path().display()
        );

        let mut args = self.options.args(remote, Tool::Scp);
        args.push(staged.path().display().to_string());
        args.push(remote.copy_destination(destination));

        self.run(Tool::Scp, args, timeout).await
    }
}
