//! Request and response types carried in native messaging frames
//!
//! Requests arrive as loosely-typed JSON objects keyed by an `action`
//! string. They are parsed once into [`Request`], a closed set of variants
//! that each carry only the fields their action needs, so a handler never
//! probes a map for keys.
//!
//! Every response carries a `status` from the closed [`Status`] vocabulary
//! plus whichever payload fields apply to it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RequestError;

/// Action names understood by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    TestConn,
    CheckFile,
    SendFile,
    InitQueue,
    SendPlan,
    PollResponses,
    ReadHeartbeat,
    WriteSettings,
    ReadSession,
    ResetSession,
    RunCommand,
    Interrupt,
}

impl Action {
    /// Every action, in wire-name order of the action table
    pub const ALL: [Action; 12] = [
        Action::TestConn,
        Action::CheckFile,
        Action::SendFile,
        Action::InitQueue,
        Action::SendPlan,
        Action::PollResponses,
        Action::ReadHeartbeat,
        Action::WriteSettings,
        Action::ReadSession,
        Action::ResetSession,
        Action::RunCommand,
        Action::Interrupt,
    ];

    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::TestConn => "test_conn",
            Action::CheckFile => "check_file",
            Action::SendFile => "send_file",
            Action::InitQueue => "init_queue",
            Action::SendPlan => "send_plan",
            Action::PollResponses => "poll_responses",
            Action::ReadHeartbeat => "read_heartbeat",
            Action::WriteSettings => "write_settings",
            Action::ReadSession => "read_session",
            Action::ResetSession => "reset_session",
            Action::RunCommand => "run_command",
            Action::Interrupt => "interrupt",
        }
    }

    /// Look up an action by wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote endpoint as supplied by the caller (not yet validated)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Hostname, `user@host`, or a configured alias
    pub target: String,
    /// Identity file path
    pub key: Option<String>,
    /// Port override
    pub port: Option<u16>,
}

/// A parsed request, one variant per action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    TestConn {
        endpoint: Endpoint,
    },
    CheckFile {
        endpoint: Endpoint,
        remote_path: String,
    },
    SendFile {
        endpoint: Endpoint,
        remote_path: String,
        content: String,
        /// Accepted for compatibility; the file is always overwritten
        overwrite: bool,
    },
    InitQueue {
        endpoint: Endpoint,
        remote_path: String,
    },
    SendPlan {
        endpoint: Endpoint,
        remote_path: String,
        plan_data: String,
    },
    PollResponses {
        endpoint: Endpoint,
        remote_path: String,
        plan_id: String,
    },
    ReadHeartbeat {
        endpoint: Endpoint,
        remote_path: String,
    },
    WriteSettings {
        endpoint: Endpoint,
        remote_path: String,
        settings_json: String,
    },
    ReadSession {
        endpoint: Endpoint,
        remote_path: String,
    },
    ResetSession {
        endpoint: Endpoint,
        remote_path: String,
        session_id: Option<String>,
        timestamp: Option<String>,
    },
    RunCommand {
        endpoint: Endpoint,
        remote_path: String,
        command: String,
    },
    Interrupt {
        endpoint: Endpoint,
        remote_path: String,
    },
}

/// Wire shape of a request before it is narrowed to a [`Request`] variant.
///
/// Fields stay untyped until the action is known, so a field the action
/// never reads cannot fail the request.
#[derive(Debug, Default, Deserialize)]
struct RawRequest {
    action: Option<Value>,
    ssh_target: Option<Value>,
    ssh_key: Option<Value>,
    ssh_port: Option<Value>,
    remote_path: Option<Value>,
    content: Option<Value>,
    overwrite: Option<Value>,
    plan_data: Option<Value>,
    plan_id: Option<Value>,
    settings_json: Option<Value>,
    session_id: Option<Value>,
    timestamp: Option<Value>,
    command: Option<Value>,
}

/// Narrow a field to a string; null and absent are None
fn text(field: &'static str, value: Option<Value>) -> Result<Option<String>, RequestError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(RequestError::InvalidField {
            field,
            reason: format!("expected a string, got {}", other),
        }),
    }
}

/// Like [`text`], treating empty strings as absent
fn present(field: &'static str, value: Option<Value>) -> Result<Option<String>, RequestError> {
    Ok(text(field, value)?.filter(|value| !value.is_empty()))
}

/// Any scalar in its string form; used where the value is only recorded
fn scalar(field: &'static str, value: Option<Value>) -> Result<Option<String>, RequestError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s).filter(|s| !s.is_empty())),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(other) => Err(RequestError::InvalidField {
            field,
            reason: format!("expected a scalar, got {}", other),
        }),
    }
}

fn parse_port(value: Option<Value>) -> Result<Option<u16>, RequestError> {
    let invalid = |reason: String| RequestError::InvalidField {
        field: "ssh_port",
        reason,
    };

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(0) => Ok(None),
            Some(port) => u16::try_from(port)
                .map(Some)
                .map_err(|_| invalid(format!("{} is out of range", port))),
            None => Err(invalid(format!("{} is not a port number", n))),
        },
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u16>()
            .map(|port| (port != 0).then_some(port))
            .map_err(|e| invalid(e.to_string())),
        Some(other) => Err(invalid(format!("unexpected value {}", other))),
    }
}

impl Request {
    /// Parse a request from a frame payload
    pub fn from_slice(payload: &[u8]) -> Result<Self, RequestError> {
        let raw: RawRequest = serde_json::from_slice(payload)?;
        Self::try_from(raw)
    }

    /// The action this request invokes
    pub fn action(&self) -> Action {
        match self {
            Request::TestConn { .. } => Action::TestConn,
            Request::CheckFile { .. } => Action::CheckFile,
            Request::SendFile { .. } => Action::SendFile,
            Request::InitQueue { .. } => Action::InitQueue,
            Request::SendPlan { .. } => Action::SendPlan,
            Request::PollResponses { .. } => Action::PollResponses,
            Request::ReadHeartbeat { .. } => Action::ReadHeartbeat,
            Request::WriteSettings { .. } => Action::WriteSettings,
            Request::ReadSession { .. } => Action::ReadSession,
            Request::ResetSession { .. } => Action::ResetSession,
            Request::RunCommand { .. } => Action::RunCommand,
            Request::Interrupt { .. } => Action::Interrupt,
        }
    }

    /// The remote endpoint this request targets
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            Request::TestConn { endpoint }
            | Request::CheckFile { endpoint, .. }
            | Request::SendFile { endpoint, .. }
            | Request::InitQueue { endpoint, .. }
            | Request::SendPlan { endpoint, .. }
            | Request::PollResponses { endpoint, .. }
            | Request::ReadHeartbeat { endpoint, .. }
            | Request::WriteSettings { endpoint, .. }
            | Request::ReadSession { endpoint, .. }
            | Request::ResetSession { endpoint, .. }
            | Request::RunCommand { endpoint, .. }
            | Request::Interrupt { endpoint, .. } => endpoint,
        }
    }
}

impl TryFrom<RawRequest> for Request {
    type Error = RequestError;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        let name = match raw.action {
            None | Some(Value::Null) => return Err(RequestError::MissingAction),
            Some(Value::String(name)) => name,
            Some(other) => return Err(RequestError::UnknownAction(other.to_string())),
        };
        let action = Action::from_name(&name).ok_or(RequestError::UnknownAction(name))?;

        let target = present("ssh_target", raw.ssh_target)?;

        // Each action names its required fields in its own error message
        let missing = match action {
            Action::TestConn => "ssh_target",
            Action::SendFile => "ssh_target, remote_path, or content",
            Action::SendPlan => "ssh_target, remote_path, or plan_data",
            Action::PollResponses => "ssh_target, remote_path, or plan_id",
            Action::WriteSettings => "ssh_target, remote_path, or settings_json",
            Action::RunCommand => "ssh_target, remote_path, or command",
            _ => "ssh_target or remote_path",
        };

        let target = target.ok_or(RequestError::MissingFields(missing))?;
        let endpoint = Endpoint {
            target,
            key: present("ssh_key", raw.ssh_key)?,
            port: parse_port(raw.ssh_port)?,
        };

        // Only TestConn works without a project path
        let remote_path = match action {
            Action::TestConn => Err(RequestError::MissingFields(missing)),
            _ => present("remote_path", raw.remote_path)?
                .ok_or(RequestError::MissingFields(missing)),
        };
        let required = |field: &'static str, value: Option<Value>| -> Result<String, RequestError> {
            present(field, value)?.ok_or(RequestError::MissingFields(missing))
        };

        let request = match action {
            Action::TestConn => Request::TestConn { endpoint },
            Action::CheckFile => Request::CheckFile {
                endpoint,
                remote_path: remote_path?,
            },
            Action::SendFile => Request::SendFile {
                endpoint,
                remote_path: remote_path?,
                // Empty content is a valid (empty) file
                content: text("content", raw.content)?
                    .ok_or(RequestError::MissingFields(missing))?,
                overwrite: matches!(raw.overwrite, Some(Value::Bool(true))),
            },
            Action::InitQueue => Request::InitQueue {
                endpoint,
                remote_path: remote_path?,
            },
            Action::SendPlan => Request::SendPlan {
                endpoint,
                remote_path: remote_path?,
                plan_data: required("plan_data", raw.plan_data)?,
            },
            Action::PollResponses => Request::PollResponses {
                endpoint,
                remote_path: remote_path?,
                plan_id: required("plan_id", raw.plan_id)?,
            },
            Action::ReadHeartbeat => Request::ReadHeartbeat {
                endpoint,
                remote_path: remote_path?,
            },
            Action::WriteSettings => Request::WriteSettings {
                endpoint,
                remote_path: remote_path?,
                settings_json: required("settings_json", raw.settings_json)?,
            },
            Action::ReadSession => Request::ReadSession {
                endpoint,
                remote_path: remote_path?,
            },
            Action::ResetSession => Request::ResetSession {
                endpoint,
                remote_path: remote_path?,
                session_id: present("session_id", raw.session_id)?,
                timestamp: scalar("timestamp", raw.timestamp)?,
            },
            Action::RunCommand => Request::RunCommand {
                endpoint,
                remote_path: remote_path?,
                command: required("command", raw.command)?,
            },
            Action::Interrupt => Request::Interrupt {
                endpoint,
                remote_path: remote_path?,
            },
        };

        Ok(request)
    }
}

/// Response status vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Action completed
    Success,
    /// Action failed; see `message` (or `error` for remote commands)
    Error,
    /// Read returned data
    Ok,
    /// Read found nothing yet
    Empty,
    /// No heartbeat from the remote watcher
    NotRunning,
    /// Interrupt marker created
    InterruptSent,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::Error => write!(f, "error"),
            Status::Ok => write!(f, "ok"),
            Status::Empty => write!(f, "empty"),
            Status::NotRunning => write!(f, "not_running"),
            Status::InterruptSent => write!(f, "interrupt_sent"),
        }
    }
}

/// Response sent back to the extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Response {
    /// Bare response with the given status
    pub fn new(status: Status) -> Self {
        Self {
            status,
            message: None,
            exists: None,
            size: None,
            modified: None,
            content: None,
            timestamp: None,
            session_id: None,
            output: None,
            error: None,
            id: None,
        }
    }

    pub fn success() -> Self {
        Self::new(Status::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error).with_message(message)
    }

    pub fn ok() -> Self {
        Self::new(Status::Ok)
    }

    pub fn empty() -> Self {
        Self::new(Status::Empty)
    }

    pub fn not_running() -> Self {
        Self::new(Status::NotRunning)
    }

    pub fn interrupt_sent() -> Self {
        Self::new(Status::InterruptSent)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach file existence and, when known, its size and modification time
    pub fn with_file_info(mut self, info: Option<(u64, String)>) -> Self {
        self.exists = Some(info.is_some());
        if let Some((size, modified)) = info {
            self.size = Some(size);
            self.modified = Some(modified);
        }
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach captured output of a remote command
    pub fn with_output(mut self, output: impl Into<String>, error: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self.error = Some(error.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whether this response reports a failure
    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}
