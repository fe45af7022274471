use crate::error::ChildError;
use hermes_core::{BackendImplementation, ProxyTarget};
use hermes_wire::{Message, ParamsTarget, StatusCode};

/// Dispatches one decoded request to `backend` and builds the matching
/// response, per the request/response table the helper loop implements.
pub(crate) async fn dispatch(backend: &dyn BackendImplementation, request: Message) -> Result<Message, ChildError> {
    Ok(match request {
        Message::Start { args } => {
            let (is_running, message) = match backend.start_backend(&args).await {
                Ok(ok) => (ok, String::new()),
                Err(err) => (false, err.to_string()),
            };
            let status_code = if is_running { StatusCode::Success } else { StatusCode::Failure };
            Message::BackendStatusResponse { is_running, status_code, message }
        }
        Message::Stop => {
            let (stopped, message) = match backend.stop_backend().await {
                Ok(ok) => (ok, String::new()),
                Err(err) => (false, err.to_string()),
            };
            let status_code = if stopped { StatusCode::Success } else { StatusCode::Failure };
            Message::BackendStatusResponse { is_running: !stopped, status_code, message }
        }
        Message::BackendStatusRequest => match backend.backend_status().await {
            Ok(running) => Message::BackendStatusResponse { is_running: running, status_code: StatusCode::Success, message: String::new() },
            Err(err) => Message::BackendStatusResponse { is_running: false, status_code: StatusCode::Failure, message: err.to_string() },
        },
        Message::AddProxy { source_ip, source_port, dest_port, protocol } => {
            let target = ProxyTarget { source_ip, source_port, dest_port, protocol };
            let is_active = matches!(backend.start_proxy(target).await, Ok(true));
            Message::ProxyStatusResponse { source_ip, source_port, dest_port, protocol, is_active }
        }
        Message::RemoveProxy { source_ip, source_port, dest_port, protocol } => {
            let target = ProxyTarget { source_ip, source_port, dest_port, protocol };
            // Standardized: this always answers with ProxyStatusResponse. A
            // successful removal reports isActive=false; any other outcome
            // leaves the prior (active) state reported, since nothing changed.
            let is_active = !matches!(backend.stop_proxy(target).await, Ok(true));
            Message::ProxyStatusResponse { source_ip, source_port, dest_port, protocol, is_active }
        }
        Message::ProxyConnectionsRequest => {
            let connections = backend.client_connections().await;
            Message::ProxyConnectionsResponse { connections }
        }
        Message::CheckClientParameters { source_ip, source_port, dest_port, protocol } => {
            let target = ProxyTarget { source_ip, source_port, dest_port, protocol };
            let result = backend.check_client_parameters(target).await;
            Message::CheckParametersResponse { in_response_to: ParamsTarget::Client, is_valid: result.is_valid, message: result.message }
        }
        Message::CheckServerParameters { args } => {
            let result = backend.check_server_parameters(&args).await;
            Message::CheckParametersResponse { in_response_to: ParamsTarget::Server, is_valid: result.is_valid, message: result.message }
        }
        other => return Err(ChildError::UnexpectedMessage(other.tag())),
    })
}
