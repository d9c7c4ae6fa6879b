//! Per-request view of one remote endpoint
//!
//! Wraps a validated [`Remote`] with the transport and the configured time
//! budgets, and turns transport outcomes into [`RelayError`]s so handlers
//! only deal with what the remote side said.

use std::time::Duration;

use pd_core::config::RelayConfig;
use pd_core::{shell_join, shell_quote, ExecOutput, Operation, RelayError, Remote, Transport};
use pd_protocol::Endpoint;

/// A validated endpoint bound to a transport
pub struct RemoteClient<'a, T: ?Sized> {
    transport: &'a T,
    config: &'a RelayConfig,
    remote: Remote,
}

impl<'a, T: Transport + ?Sized> RemoteClient<'a, T> {
    /// Validate the endpoint and bind it to the transport
    pub fn connect(
        transport: &'a T,
        config: &'a RelayConfig,
        endpoint: &Endpoint,
    ) -> Result<Self, RelayError> {
        Ok(Self {
            transport,
            config,
            remote: Remote::from_endpoint(endpoint)?,
        })
    }

    pub fn target(&self) -> &str {
        self.remote.target()
    }

    pub fn config(&self) -> &RelayConfig {
        self.config
    }

    /// Run a short remote command; the exit status is left to the caller
    pub async fn exec(&self, command: &str) -> Result<ExecOutput, RelayError> {
        self.exec_within(command, self.config.exec_timeout, Operation::Exec)
            .await
    }

    /// Run a remote command under an explicit budget
    pub async fn exec_within(
        &self,
        command: &str,
        timeout: Duration,
        operation: Operation,
    ) -> Result<ExecOutput, RelayError> {
        self.transport
            .exec(&self.remote, command, timeout)
            .await
            .map_err(|e| {
                tracing::error!("Transport failed on {}: {}", self.target(), e);
                RelayError::from_transport(operation, e)
            })
    }

    /// Run a short remote command that must exit zero.
    ///
    /// A failure is reported with the remote stderr, or `fallback` if the
    /// remote printed nothing.
    pub async fn exec_checked(&self, command: &str, fallback: &str) -> Result<ExecOutput, RelayError> {
        let output = self.exec(command).await?;
        if output.success() {
            Ok(output)
        } else {
            let error = output.error_text(fallback);
            tracing::error!("Remote command failed on {}: {}", self.target(), error);
            Err(RelayError::Remote(error))
        }
    }

    /// Create directories (and parents); idempotent
    pub async fn make_dirs<I, S>(&self, dirs: I, fallback: &str) -> Result<(), RelayError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exec_checked(&shell_join("mkdir -p", dirs), fallback)
            .await
            .map(drop)
    }

    /// Copy `contents` to `destination`, replacing any existing file
    pub async fn upload(
        &self,
        contents: &[u8],
        destination: &str,
        fallback: &str,
    ) -> Result<(), RelayError> {
        let output = self
            .transport
            .upload(&self.remote, contents, destination, self.config.copy_timeout)
            .await
            .map_err(|e| {
                tracing::error!("Copy to {} failed: {}", self.target(), e);
                RelayError::from_transport(Operation::Copy, e)
            })?;

        if output.success() {
            Ok(())
        } else {
            let error = output.error_text(fallback);
            tracing::error!("Copy to {}:{} failed: {}", self.target(), destination, error);
            Err(RelayError::Remote(error))
        }
    }

    /// Read a small remote file.
    ///
    /// Returns None when the file is missing or blank. Only a failure of
    /// the transport itself is an error.
    pub async fn read_file(&self, path: &str) -> Result<Option<String>, RelayError> {
        let output = self
            .exec(&format!("cat {} 2>/dev/null", shell_quote(path)))
            .await?;

        if output.transport_failed() {
            let error = output.error_text("Connection failed");
            tracing::error!("Reading {} on {} failed: {}", path, self.target(), error);
            return Err(RelayError::Remote(error));
        }

        if output.stdout.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(output.stdout))
        }
    }
}
