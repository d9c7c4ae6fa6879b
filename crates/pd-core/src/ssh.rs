//! Construction of ssh/scp invocations
//!
//! Both transports share one option set: batch mode (never prompt), accept
//! new host keys, a bounded connect timeout, and connection multiplexing.
//! Multiplexing keeps one authenticated master channel per user/host/port
//! alive for `control_persist` after the last command, so a burst of polls
//! pays for a single handshake.

use std::fmt;
use std::time::Duration;

use pd_protocol::Endpoint;

use crate::error::ValidationError;
use crate::validate::{validate_path, validate_target};

/// External transport executables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Remote execute
    Ssh,
    /// Remote copy
    Scp,
}

impl Tool {
    /// Flag used to pass a port; ssh and scp disagree on the letter
    pub fn port_flag(&self) -> &'static str {
        match self {
            Tool::Ssh => "-p",
            Tool::Scp => "-P",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::Ssh => write!(f, "SSH"),
            Tool::Scp => write!(f, "SCP"),
        }
    }
}

/// A validated remote endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    target: String,
    identity: Option<String>,
    port: Option<u16>,
}

impl Remote {
    /// Validate the caller-supplied endpoint
    pub fn from_endpoint(endpoint: &Endpoint) -> Result<Self, ValidationError> {
        let target = validate_target(&endpoint.target)?.to_string();
        let identity = endpoint
            .key
            .as_deref()
            .map(validate_path)
            .transpose()?
            .map(str::to_string);

        Ok(Self {
            target,
            identity,
            port: endpoint.port,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// `target:path` destination for a copy
    pub fn copy_destination(&self, path: &str) -> String {
        format!("{}:{}", self.target, path)
    }
}

/// Options shared by every transport invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshOptions {
    /// ConnectTimeout for the initial handshake
    pub connect_timeout: Duration,
    /// ControlPath template, keyed by `%r@%h:%p`
    pub control_path: String,
    /// How long an idle master channel is kept open
    pub control_persist: Duration,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            control_path: "/tmp/plandrop-%r@%h:%p".to_string(),
            control_persist: Duration::from_secs(60),
        }
    }
}

impl SshOptions {
    /// Argument list placed before the target for `tool`
    pub fn args(&self, remote: &Remote, tool: Tool) -> Vec<String> {
        let mut args = Vec::with_capacity(16);

        if let Some(identity) = remote.identity() {
            args.push("-i".to_string());
            args.push(identity.to_string());
        }

        if let Some(port) = remote.port() {
            args.push(tool.port_flag().to_string());
            args.push(port.to_string());
        }

        for option in [
            "BatchMode=yes".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs()),
            "ControlMaster=auto".to_string(),
            format!("ControlPath={}", self.control_path),
            format!("ControlPersist={}", self.control_persist.as_secs()),
        ] {
            args.push("-o".to_string());
            args.push(option);
        }

        args
    }
}

/// Quote a value for a POSIX shell
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        "''".into()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Join a program and its arguments into one remote command line,
/// quoting every argument
pub fn shell_join<I, S>(program: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(arg.as_ref()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(target: &str, key: Option<&str>, port: Option<u16>) -> Endpoint {
        Endpoint {
            target: target.to_string(),
            key: key.map(str::to_string),
            port,
        }
    }

    #[test]
    fn test_default_args() {
        let remote = Remote::from_endpoint(&endpoint("user@host", None, None)).unwrap();
        let args = SshOptions::default().args(&remote, Tool::Ssh);

        assert_eq!(
            args,
            vec![
                "-o",
                "BatchMode=yes",
                "-o",
                "StrictHostKeyChecking=accept-new",
                "-o",
                "ConnectTimeout=5",
                "-o",
                "ControlMaster=auto",
                "-o",
                "ControlPath=/tmp/plandrop-%r@%h:%p",
                "-o",
                "ControlPersist=60",
            ]
        );
    }

    #[test]
    fn test_port_flag_differs_by_tool() {
        let remote =
            Remote::from_endpoint(&endpoint("host", Some("/keys/id_ed25519"), Some(2222))).unwrap();
        let options = SshOptions::default();

        let ssh = options.args(&remote, Tool::Ssh);
        assert_eq!(&ssh[..4], &["-i", "/keys/id_ed25519", "-p", "2222"]);

        let scp = options.args(&remote, Tool::Scp);
        assert_eq!(&scp[..4], &["-i", "/keys/id_ed25519", "-P", "2222"]);

        // Everything after the endpoint-specific flags is shared
        assert_eq!(ssh[4..], scp[4..]);
    }

    #[test]
    fn test_remote_validation() {
        assert!(Remote::from_endpoint(&endpoint("host$(id)", None, None)).is_err());
        assert!(Remote::from_endpoint(&endpoint("host", Some("/k;rm"), None)).is_err());
        assert!(Remote::from_endpoint(&endpoint("", None, None)).is_err());
    }

    #[test]
    fn test_copy_destination() {
        let remote = Remote::from_endpoint(&endpoint("dev@box", None, None)).unwrap();
        assert_eq!(
            remote.copy_destination("/srv/app/.plandrop/plans/a.json"),
            "dev@box:/srv/app/.plandrop/plans/a.json"
        );
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("/home/me/My Docs"), "'/home/me/My Docs'");
        assert_eq!(shell_quote("a'b"), "'a'\\''b'");
    }

    #[test]
    fn test_shell_join() {
        assert_eq!(
            shell_join("mkdir -p", ["/a b/plans", "/a b/responses"]),
            "mkdir -p '/a b/plans' '/a b/responses'"
        );
        assert_eq!(shell_join("touch", ["/p/.plandrop/interrupt"]), "touch '/p/.plandrop/interrupt'");
    }
}
