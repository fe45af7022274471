use hermes_wire::WireError;
use thiserror::Error;

/// Failures surfaced by [`crate::Supervisor::submit`].
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("failed to schedule request after 50 tries")]
    SchedulingTimeout,

    #[error("control connection closed before a response arrived")]
    ConnectionReset,

    #[error("failed to encode or decode request: {0}")]
    Wire(#[from] WireError),

    #[error("control connection I/O error: {0}")]
    Io(String),

    #[error("reply channel dropped without a response")]
    ChannelClosed,
}

/// Failures surfaced by supervisor lifecycle operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("supervisor is already running")]
    AlreadyRunning,

    #[error("supervisor is not running")]
    NotRunning,

    #[error("failed to allocate control socket: {0}")]
    Socket(#[from] hermes_support::SocketError),
}

/// Failures surfaced by [`crate::registry::AvailableBackends::load_manifest`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read manifest {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("failed to parse manifest {path}: {source}")]
    Parse { path: String, source: toml::de::Error },

    #[error("no backend registered under id {0}")]
    UnknownBackend(String),

    #[error("backend {0} is already registered")]
    DuplicateBackend(String),
}
