//! Allow-listed remote command runner
//!
//! `run_command` is a capability restriction, not a remote shell. A command
//! may carry one leading `cd <dir> &&`; what follows must start an allowed
//! program (or `python3` with an allowed script) and must not contain any
//! shell metacharacter, so it cannot chain, pipe, redirect or substitute.

use pd_core::config::RelayConfig;
use pd_core::validate::{has_shell_meta, validate_path};
use pd_core::{Operation, RelayError, Transport, ValidationError};
use pd_protocol::{Response, Status};

use crate::remote::RemoteClient;

const PYTHON: &str = "python3";

/// Programs and scripts `run_command` may start
#[derive(Debug, Clone)]
pub struct AllowList {
    programs: Vec<String>,
    scripts: Vec<String>,
}

impl AllowList {
    pub fn new(programs: Vec<String>, scripts: Vec<String>) -> Self {
        Self { programs, scripts }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.allowed_programs.clone(), config.allowed_scripts.clone())
    }

    /// Accept or reject a command line before anything is sent
    pub fn check(&self, command: &str) -> Result<(), ValidationError> {
        let mut line = command.trim();

        if let Some(rest) = line.strip_prefix("cd ") {
            if let Some((dir, tail)) = rest.split_once("&&") {
                validate_path(dir.trim())?;
                line = tail.trim();
            }
        }

        if has_shell_meta(line) {
            return Err(self.rejection());
        }

        let mut words = line.split_whitespace();
        let allowed = match words.next() {
            Some(PYTHON) => words.next().is_some_and(|script| self.is_script(script)),
            Some(program) => self.programs.iter().any(|p| p == program),
            None => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(self.rejection())
        }
    }

    fn is_script(&self, arg: &str) -> bool {
        let name = arg.rsplit('/').next().unwrap_or(arg);
        self.scripts.iter().any(|s| s == name)
    }

    fn rejection(&self) -> ValidationError {
        ValidationError::CommandNotAllowed(format!(
            "Only {} commands allowed",
            self.programs.join(", ")
        ))
    }
}

/// Run an allow-listed command and return its captured output
pub async fn run_command<T: Transport + ?Sized>(
    client: &RemoteClient<'_, T>,
    remote_path: &str,
    command: &str,
) -> Result<Response, RelayError> {
    validate_path(remote_path)?;

    if let Err(e) = AllowList::from_config(client.config()).check(command) {
        tracing::warn!("Blocked command for {}: {}", client.target(), command);
        return Err(e.into());
    }

    tracing::info!("Running command on {}: {}", client.target(), command);
    let output = client
        .exec_within(command, client.config().command_timeout, Operation::Command)
        .await?;

    if output.success() {
        Ok(Response::ok().with_output(output.stdout, output.stderr))
    } else {
        let error = output.error_text(&output.exit_description());
        tracing::error!("Command failed on {}: {}", client.target(), error);
        Ok(Response::new(Status::Error).with_output(output.stdout, error))
    }
}
