use thiserror::Error;

/// Errors a concrete `BackendImplementation` can surface from its methods.
///
/// These travel back to the child's protocol loop, which folds them into a
/// `BackendStatusResponse`/`ProxyStatusResponse`/`CheckParametersResponse`
/// message rather than aborting the loop — only a decode error on the wire
/// itself terminates the child.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend parameters: {0}")]
    InvalidParameters(String),

    #[error("backend is not initialized")]
    NotInitialized,

    #[error("dial failed: {0}")]
    DialFailed(String),

    #[error("no proxy matches the given source/destination/protocol")]
    ProxyNotFound,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
