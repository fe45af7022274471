use thiserror::Error;

#[derive(Debug, Error)]
pub enum SshBackendError {
    #[error("backend has not been started")]
    NotStarted,

    #[error("invalid backend parameters: {0}")]
    InvalidParameters(String),

    #[error("failed to parse private key: {0}")]
    PrivateKey(String),

    #[error("failed to connect to {host}:{port}: {source}")]
    Connect { host: String, port: u16, source: russh::Error },

    #[error("failed to bind remote forward on {ip}:{port}: {source}")]
    Forward { ip: String, port: u16, source: russh::Error },

    #[error("no such proxy registered")]
    ProxyNotFound,
}

impl From<SshBackendError> for hermes_core::BackendError {
    fn from(err: SshBackendError) -> Self {
        hermes_core::BackendError::Internal(err.to_string())
    }
}
