//! Remote queue client
//!
//! Implements the relay's half of the file-based contract with the remote
//! watcher. From the relay's point of view a project moves through:
//!
//! - *uninitialized*: no `.plandrop/`
//! - *initialized*: queue directories and `watch.sh` present (`init_queue`)
//! - *active*: the watcher has written a `session_id`
//! - *idle*: `reset_session` archived and removed the `session_id`
//!
//! Nothing is cached here. Every poll re-reads the remote files, since the
//! watcher may change them at any time.

use std::path::Path;

use pd_core::{shell_join, shell_quote, Identifier, QueueLayout, RelayError, Transport};
use pd_protocol::Response;
use serde_json::Value;

use crate::remote::RemoteClient;

/// Queue operations for one remote project
pub struct QueueClient<'a, T: ?Sized> {
    client: RemoteClient<'a, T>,
    layout: QueueLayout,
}

impl<'a, T: Transport + ?Sized> QueueClient<'a, T> {
    pub fn new(client: RemoteClient<'a, T>, layout: QueueLayout) -> Self {
        Self { client, layout }
    }

    /// Create the queue directories and deploy the watcher script.
    ///
    /// Safe to repeat: `mkdir -p` keeps existing directories and their files.
    pub async fn init(&self, watch_script: &Path) -> Result<Response, RelayError> {
        let script = std::fs::read(watch_script).map_err(|e| {
            tracing::error!("Cannot read {}: {}", watch_script.display(), e);
            RelayError::Unavailable(format!(
                "watch.sh not found at {}",
                watch_script.display()
            ))
        })?;

        let root = self.layout.root();
        tracing::info!("Initializing queue at {}:{}", self.client.target(), root);

        self.client
            .make_dirs(self.layout.directories(), "Failed to create directories")
            .await?;

        self.client
            .upload(&script, &self.layout.watch_script(), "Failed to copy watch.sh")
            .await?;

        self.client
            .exec_checked(
                &shell_join("chmod +x", [self.layout.watch_script()]),
                "Failed to make watch.sh executable",
            )
            .await?;

        tracing::info!("Queue initialized at {}:{}", self.client.target(), root);
        Ok(Response::success().with_message(format!("Queue initialized at {}", root)))
    }

    /// Submit a plan to `plans/<id>.json`.
    ///
    /// The body is copied as a single file. Partial reads while the copy is
    /// in flight are the watcher's to tolerate.
    pub async fn send_plan(&self, plan_data: &str) -> Result<Response, RelayError> {
        let id = plan_id(plan_data)?;
        let destination = self.layout.plan_file(&id);
        tracing::info!("Sending plan {} to {}:{}", id, self.client.target(), destination);

        self.client
            .upload(plan_data.as_bytes(), &destination, "SCP failed")
            .await?;

        tracing::info!("Plan {} sent successfully", id);
        Ok(Response::success().with_id(id.as_str()))
    }

    /// Read everything the watcher has written for a plan so far.
    ///
    /// A missing file and an empty file are both `empty`; the watcher
    /// creates the file lazily.
    pub async fn poll_responses(&self, plan_id: &str) -> Result<Response, RelayError> {
        let id = Identifier::plan(plan_id)?;
        let path = self.layout.response_file(&id);
        tracing::debug!("Polling response: {}:{}", self.client.target(), path);

        Ok(match self.client.read_file(&path).await? {
            Some(content) => Response::ok().with_content(content),
            None => Response::empty(),
        })
    }

    /// Read the watcher's liveness timestamp
    pub async fn read_heartbeat(&self) -> Result<Response, RelayError> {
        let path = self.layout.heartbeat_file();
        tracing::debug!("Reading heartbeat: {}:{}", self.client.target(), path);

        Ok(match self.client.read_file(&path).await? {
            Some(timestamp) => Response::ok().with_timestamp(timestamp.trim()),
            None => Response::not_running(),
        })
    }

    /// Read the current agent session id
    pub async fn read_session(&self) -> Result<Response, RelayError> {
        let path = self.layout.session_file();
        tracing::debug!("Reading session: {}:{}", self.client.target(), path);

        Ok(match self.client.read_file(&path).await? {
            Some(session_id) => Response::ok().with_session_id(session_id.trim()),
            None => Response::empty(),
        })
    }

    /// Archive the current session (if given) and remove `session_id`.
    ///
    /// Both steps go out as one remote command joined by `&&`, so the file
    /// is never removed without its history entry having been appended.
    pub async fn reset_session(
        &self,
        session_id: Option<&str>,
        timestamp: Option<&str>,
    ) -> Result<Response, RelayError> {
        let remove = shell_join("rm -f", [self.layout.session_file()]);

        let command = match session_id {
            Some(session_id) => {
                let id = Identifier::session(session_id)?;
                let entry = serde_json::json!({
                    "session_id": id.as_str(),
                    "ended": timestamp.unwrap_or(""),
                });
                format!(
                    "printf '%s\\n' {} >> {} && {}",
                    shell_quote(&entry.to_string()),
                    shell_quote(&self.layout.session_history_file()),
                    remove
                )
            }
            None => remove,
        };

        tracing::info!("Resetting session on {}:{}", self.client.target(), self.layout.project());
        self.client
            .exec_checked(&command, "Failed to reset session")
            .await?;

        tracing::info!("Session reset successfully on {}", self.client.target());
        Ok(Response::success().with_message("Session reset"))
    }

    /// Drop the interrupt marker for the watcher.
    ///
    /// Only creation of the marker is guaranteed; when the running task
    /// notices it is up to the watcher's polling.
    pub async fn interrupt(&self) -> Result<Response, RelayError> {
        let path = self.layout.interrupt_file();
        tracing::info!("Sending interrupt signal to {}:{}", self.client.target(), path);

        let output = self
            .client
            .exec_within(
                &shell_join("touch", [&path]),
                self.client.config().interrupt_timeout,
                pd_core::Operation::Exec,
            )
            .await?;

        if !output.success() {
            let error = output.error_text(&output.exit_description());
            tracing::error!("Failed to send interrupt: {}", error);
            return Err(RelayError::Remote(error));
        }

        tracing::info!("Interrupt signal sent successfully");
        Ok(Response::interrupt_sent())
    }
}

/// Extract and validate the `id` of a plan document
fn plan_id(plan_data: &str) -> Result<Identifier, RelayError> {
    let plan: Value = serde_json::from_str(plan_data)
        .map_err(|e| RelayError::InvalidPayload(format!("Invalid plan JSON: {}", e)))?;

    let plan = plan
        .as_object()
        .ok_or_else(|| RelayError::InvalidPayload("Plan data must be a JSON object".to_string()))?;

    match plan.get("id") {
        None | Some(Value::Null) => Err(RelayError::InvalidPayload(
            "Plan data missing 'id' field".to_string(),
        )),
        Some(Value::String(id)) if id.is_empty() => Err(RelayError::InvalidPayload(
            "Plan data missing 'id' field".to_string(),
        )),
        Some(Value::String(id)) => Ok(Identifier::plan(id)?),
        Some(_) => Err(pd_core::ValidationError::InvalidIdentifier { kind: "plan_id" }.into()),
    }
}
