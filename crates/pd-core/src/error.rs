//! Core error types for the PlanDrop relay

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::ssh::Tool;

/// Top-level error type for action handlers
///
/// Every variant is recovered by the dispatcher and reported to the caller
/// as an `error` response; the display text becomes the response message.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Untrusted input rejected before any transport call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Payload JSON supplied by the caller did not parse
    #[error("{0}")]
    InvalidPayload(String),

    /// Transport call exceeded its time budget
    #[error("{}", .0.timeout_message())]
    Timeout(Operation),

    /// Transport executable missing from the local system
    #[error("{0} command not found on system")]
    TransportNotFound(Tool),

    /// Remote side exited with a failure status
    #[error("{0}")]
    Remote(String),

    /// Local resource the action depends on is missing
    #[error("{0}")]
    Unavailable(String),

    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Translate a transport failure for the given kind of operation
    pub fn from_transport(operation: Operation, err: TransportError) -> Self {
        match err {
            TransportError::TimedOut(_) => RelayError::Timeout(operation),
            TransportError::NotFound(tool) => RelayError::TransportNotFound(tool),
            TransportError::Io(e) => RelayError::Io(e),
        }
    }

    /// Whether this error was raised before touching the transport
    pub fn is_validation(&self) -> bool {
        matches!(self, RelayError::Validation(_) | RelayError::InvalidPayload(_))
    }
}

/// Kind of transport operation, used to word timeout errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Short remote command (stat, cat, mkdir, touch)
    Exec,
    /// File copy to the remote host
    Copy,
    /// Allow-listed long-running remote command
    Command,
}

impl Operation {
    fn timeout_message(&self) -> &'static str {
        match self {
            Operation::Exec => "Connection timed out",
            Operation::Copy => "Transfer timed out",
            Operation::Command => "Command timed out",
        }
    }
}

/// Input validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("SSH target cannot be empty")]
    EmptyTarget,

    #[error("SSH target contains invalid characters")]
    InvalidTarget,

    #[error("Path cannot be empty")]
    EmptyPath,

    #[error("Path contains invalid characters")]
    InvalidPath,

    #[error("Path contains invalid escape sequences")]
    EscapedQuote,

    /// Plan or session identifier outside `[A-Za-z0-9_-]+`
    #[error("Invalid {kind} format")]
    InvalidIdentifier { kind: &'static str },

    /// Remote command outside the allow-list
    #[error("{0}")]
    CommandNotAllowed(String),
}

/// Errors invoking the external transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// Executable not found
    #[error("{0} command not found on system")]
    NotFound(Tool),

    /// Invocation abandoned after the timeout
    #[error("Transport call timed out after {0:?}")]
    TimedOut(Duration),

    /// Spawn or staging failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_are_distinguishable() {
        let exec = RelayError::from_transport(
            Operation::Exec,
            TransportError::TimedOut(Duration::from_secs(10)),
        );
        let copy = RelayError::from_transport(
            Operation::Copy,
            TransportError::TimedOut(Duration::from_secs(30)),
        );
        let command = RelayError::from_transport(
            Operation::Command,
            TransportError::TimedOut(Duration::from_secs(60)),
        );

        assert_eq!(exec.to_string(), "Connection timed out");
        assert_eq!(copy.to_string(), "Transfer timed out");
        assert_eq!(command.to_string(), "Command timed out");
    }

    #[test]
    fn test_not_found_names_tool() {
        let err = RelayError::from_transport(Operation::Copy, TransportError::NotFound(Tool::Scp));
        assert_eq!(err.to_string(), "SCP command not found on system");
    }

    #[test]
    fn test_identifier_message() {
        let err = ValidationError::InvalidIdentifier { kind: "plan_id" };
        assert_eq!(err.to_string(), "Invalid plan_id format");
        assert!(RelayError::from(err).is_validation());
    }
}
