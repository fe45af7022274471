#![forbid(unsafe_code)]
//! The backend helper loop: the code that runs inside each backend child
//! process, dialling the controller's Unix socket and servicing one framed
//! request at a time against a [`BackendImplementation`].

mod dispatch;
mod error;

pub use error::ChildError;

use dispatch::dispatch;
use hermes_core::BackendImplementation;
use hermes_wire::Message;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::io::SyncIoBridge;
use tracing::{debug, warn};

/// Reads the control socket path out of the named environment variable
/// (`HERMES_API_SOCK` for the reference binaries).
pub fn socket_path_from_env(var: &str) -> Result<PathBuf, ChildError> {
    std::env::var_os(var)
        .map(PathBuf::from)
        .ok_or_else(|| ChildError::MissingSocketEnv(var.to_string()))
}

/// Dials `socket_path` once, then runs the helper loop to completion.
pub async fn run(socket_path: &Path, backend: Arc<dyn BackendImplementation>) -> Result<(), ChildError> {
    let stream = UnixStream::connect(socket_path).await.map_err(ChildError::Connect)?;
    let (read_half, write_half) = stream.into_split();
    run_on_split(read_half, write_half, backend).await
}

/// The loop itself, split out from [`run`] so it can be driven over an
/// already-established connection (used directly by tests).
///
/// Loops: decode one request, dispatch it to `backend`, encode and write
/// exactly one response. Returns on the first decode or I/O error — the
/// caller is expected to let the process exit, which the supervisor observes
/// and restarts from.
pub async fn run_on_split(
    read_half: OwnedReadHalf,
    mut write_half: OwnedWriteHalf,
    backend: Arc<dyn BackendImplementation>,
) -> Result<(), ChildError> {
    let mut bridge = SyncIoBridge::new(read_half);

    loop {
        let (returned_bridge, decoded) = tokio::task::spawn_blocking(move || {
            let result = Message::decode(&mut bridge);
            (bridge, result)
        })
        .await
        .map_err(|err| ChildError::Internal(err.to_string()))?;
        bridge = returned_bridge;

        let request = decoded?;
        debug!(tag = request.tag(), "received request");

        let response = dispatch(backend.as_ref(), request).await?;
        let encoded = response.encode().map_err(ChildError::Wire)?;

        if let Err(err) = write_half.write_all(&encoded).await {
            warn!(error = %err, "failed to write response, terminating helper loop");
            return Err(ChildError::Io(err));
        }
    }
}
