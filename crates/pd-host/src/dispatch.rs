//! Action dispatcher
//!
//! Routes a parsed [`Request`] to its handler. Every handler failure comes
//! back as an `error` response; nothing here can end the relay loop.

use pd_core::config::RelayConfig;
use pd_core::{QueueLayout, RelayError, Transport};
use pd_protocol::{Request, Response};
use tracing::Instrument;

use crate::command;
use crate::files;
use crate::queue::QueueClient;
use crate::remote::RemoteClient;

/// Routes requests to action handlers over a shared transport
pub struct Dispatcher<T> {
    transport: T,
    config: RelayConfig,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, config: RelayConfig) -> Self {
        Self { transport, config }
    }

    /// Turn one frame payload into exactly one response
    pub async fn dispatch(&self, payload: &[u8]) -> Response {
        let request = match Request::from_slice(payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Rejected request: {}", e);
                return Response::error(e.to_string());
            }
        };

        let action = request.action();
        let span = tracing::info_span!("request", %action, target = %request.endpoint().target);

        async move {
            match self.handle(request).await {
                Ok(response) => {
                    tracing::info!(status = %response.status, "Action completed");
                    response
                }
                Err(e) if e.is_validation() => {
                    tracing::warn!("Validation failed: {}", e);
                    Response::error(e.to_string())
                }
                Err(e) => {
                    tracing::error!("Action failed: {}", e);
                    Response::error(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run the handler for a request
    pub async fn handle(&self, request: Request) -> Result<Response, RelayError> {
        let client = RemoteClient::connect(&self.transport, &self.config, request.endpoint())?;

        match request {
            Request::TestConn { .. } => files::test_conn(&client).await,
            Request::CheckFile { remote_path, .. } => {
                files::check_file(&client, &remote_path).await
            }
            Request::SendFile {
                remote_path,
                content,
                overwrite,
                ..
            } => files::send_file(&client, &remote_path, &content, overwrite).await,
            Request::WriteSettings {
                remote_path,
                settings_json,
                ..
            } => {
                let layout = QueueLayout::new(&remote_path)?;
                files::write_settings(&client, &layout, &settings_json).await
            }
            Request::InitQueue { remote_path, .. } => {
                let watch_script = self.config.watch_script_path();
                queue(client, &remote_path)?.init(&watch_script).await
            }
            Request::SendPlan {
                remote_path,
                plan_data,
                ..
            } => queue(client, &remote_path)?.send_plan(&plan_data).await,
            Request::PollResponses {
                remote_path,
                plan_id,
                ..
            } => queue(client, &remote_path)?.poll_responses(&plan_id).await,
            Request::ReadHeartbeat { remote_path, .. } => {
                queue(client, &remote_path)?.read_heartbeat().await
            }
            Request::ReadSession { remote_path, .. } => {
                queue(client, &remote_path)?.read_session().await
            }
            Request::ResetSession {
                remote_path,
                session_id,
                timestamp,
                ..
            } => {
                queue(client, &remote_path)?
                    .reset_session(session_id.as_deref(), timestamp.as_deref())
                    .await
            }
            Request::Interrupt { remote_path, .. } => {
                queue(client, &remote_path)?.interrupt().await
            }
            Request::RunCommand {
                remote_path,
                command,
                ..
            } => command::run_command(&client, &remote_path, &command).await,
        }
    }
}

fn queue<'a, T: Transport + ?Sized>(
    client: RemoteClient<'a, T>,
    remote_path: &str,
) -> Result<QueueClient<'a, T>, RelayError> {
    Ok(QueueClient::new(client, QueueLayout::new(remote_path)?))
}
