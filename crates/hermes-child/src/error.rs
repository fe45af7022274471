use hermes_wire::WireError;
use thiserror::Error;

/// Everything that can end the backend helper loop.
///
/// Any variant here terminates [`crate::run`] — the child process is
/// expected to exit on error, letting the supervisor restart it.
#[derive(Debug, Error)]
pub enum ChildError {
    #[error("control socket path not set in {0}")]
    MissingSocketEnv(String),

    #[error("failed to connect to control socket: {0}")]
    Connect(#[source] std::io::Error),

    #[error("i/o error on control connection: {0}")]
    Io(#[source] std::io::Error),

    #[error("wire protocol error: {0}")]
    Wire(#[from] WireError),

    #[error("received a message type the helper loop does not expect: tag {0}")]
    UnexpectedMessage(u8),

    #[error("blocking decode task panicked: {0}")]
    Internal(String),
}
