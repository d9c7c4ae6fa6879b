//! Recording transport for handler tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pd_core::config::RelayConfig;
use pd_core::{ExecOutput, Remote, Transport, TransportError};
use pd_protocol::Endpoint;

/// One recorded transport invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Exec {
        target: String,
        command: String,
        timeout: Duration,
    },
    Upload {
        target: String,
        destination: String,
        contents: String,
    },
}

impl Call {
    pub fn command(&self) -> Option<&str> {
        match self {
            Call::Exec { command, .. } => Some(command),
            Call::Upload { .. } => None,
        }
    }
}

/// Transport that records calls and replays scripted outcomes.
///
/// Calls beyond the script succeed with empty output.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    script: Mutex<VecDeque<Result<ExecOutput, TransportError>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next call
    pub fn then(self, outcome: Result<ExecOutput, TransportError>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|call| call.command().map(str::to_string))
            .collect()
    }

    fn next(&self, call: Call) -> Result<ExecOutput, TransportError> {
        self.calls.lock().unwrap().push(call);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ExecOutput::ok("")))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn exec(
        &self,
        remote: &Remote,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, TransportError> {
        self.next(Call::Exec {
            target: remote.target().to_string(),
            command: command.to_string(),
            timeout,
        })
    }

    async fn upload(
        &self,
        remote: &Remote,
        contents: &[u8],
        destination: &str,
        _timeout: Duration,
    ) -> Result<ExecOutput, TransportError> {
        self.next(Call::Upload {
            target: remote.target().to_string(),
            destination: destination.to_string(),
            contents: String::from_utf8_lossy(contents).into_owned(),
        })
    }
}

pub fn endpoint(target: &str) -> Endpoint {
    Endpoint {
        target: target.to_string(),
        key: None,
        port: None,
    }
}

pub fn config() -> RelayConfig {
    RelayConfig::default()
}
