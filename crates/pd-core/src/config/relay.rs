//! Relay configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::default_config_dir;
use super::serde_utils::duration_secs;
use crate::layout::WATCH_SCRIPT;
use crate::ssh::SshOptions;
use crate::transport::SshTransport;

/// Configuration for the relay process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Remote-execute executable
    pub ssh_program: String,

    /// Remote-copy executable
    pub scp_program: String,

    /// Handshake timeout passed to the transport
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Budget for short remote commands (stat, cat, mkdir, rm)
    #[serde(with = "duration_secs")]
    pub exec_timeout: Duration,

    /// Budget for file copies
    #[serde(with = "duration_secs")]
    pub copy_timeout: Duration,

    /// Budget for allow-listed remote commands
    #[serde(with = "duration_secs")]
    pub command_timeout: Duration,

    /// Budget for creating the interrupt marker
    #[serde(with = "duration_secs")]
    pub interrupt_timeout: Duration,

    /// Multiplexing control socket template
    pub control_path: String,

    /// Idle lifetime of the multiplexing master
    #[serde(with = "duration_secs")]
    pub control_persist: Duration,

    /// Local watcher script deployed by `init_queue`.
    /// Defaults to `watch.sh` next to the relay executable.
    pub watch_script: Option<PathBuf>,

    /// Programs `run_command` may start
    pub allowed_programs: Vec<String>,

    /// Scripts `run_command` may start through `python3`
    pub allowed_scripts: Vec<String>,

    /// Log file location
    pub log_file: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let ssh = SshOptions::default();
        Self {
            ssh_program: "ssh".to_string(),
            scp_program: "scp".to_string(),
            connect_timeout: ssh.connect_timeout,
            // Outlives the handshake so a slow connect still reports its own error
            exec_timeout: ssh.connect_timeout + Duration::from_secs(5),
            copy_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(60),
            interrupt_timeout: Duration::from_secs(10),
            control_path: ssh.control_path,
            control_persist: ssh.control_persist,
            watch_script: None,
            allowed_programs: vec!["plandrop-history".to_string()],
            allowed_scripts: vec!["history.py".to_string()],
            log_file: default_config_dir().join("relay.log"),
        }
    }
}

impl RelayConfig {
    /// Transport options derived from this config
    pub fn ssh_options(&self) -> SshOptions {
        SshOptions {
            connect_timeout: self.connect_timeout,
            control_path: self.control_path.clone(),
            control_persist: self.control_persist,
        }
    }

    /// Build the subprocess transport described by this config
    pub fn transport(&self) -> SshTransport {
        SshTransport::new(self.ssh_options(), &self.ssh_program, &self.scp_program)
    }

    /// Resolve the watcher script path
    pub fn watch_script_path(&self) -> PathBuf {
        if let Some(path) = &self.watch_script {
            return path.clone();
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(WATCH_SCRIPT)))
            .unwrap_or_else(|| PathBuf::from(WATCH_SCRIPT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.exec_timeout, Duration::from_secs(10));
        assert_eq!(config.copy_timeout, Duration::from_secs(30));
        assert_eq!(config.command_timeout, Duration::from_secs(60));
        assert_eq!(config.ssh_options(), SshOptions::default());
        assert!(config.log_file.ends_with("relay.log"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            ssh_program = "/usr/local/bin/ssh"
            exec_timeout = 3
            allowed_programs = ["plandrop-history", "plandrop-export"]
            "#,
        )
        .unwrap();

        assert_eq!(config.ssh_program, "/usr/local/bin/ssh");
        assert_eq!(config.exec_timeout, Duration::from_secs(3));
        assert_eq!(config.scp_program, "scp");
        assert_eq!(config.allowed_programs.len(), 2);
        assert_eq!(config.copy_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_explicit_watch_script() {
        let config = RelayConfig {
            watch_script: Some(PathBuf::from("/opt/plandrop/watch.sh")),
            ..Default::default()
        };
        assert_eq!(
            config.watch_script_path(),
            PathBuf::from("/opt/plandrop/watch.sh")
        );
    }

    #[test]
    fn test_default_watch_script_name() {
        assert!(RelayConfig::default()
            .watch_script_path()
            .ends_with(WATCH_SCRIPT));
    }
}
