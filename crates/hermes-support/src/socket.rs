use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::UnixListener;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("failed to create control socket directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to bind control socket {path}: {source}")]
    Bind { path: PathBuf, source: io::Error },
}

/// Allocates a fresh per-supervisor control socket path under `base_dir`
/// (`${base_dir}/<random>/<random>.sock`) and binds a listener on it. Each
/// supervisor gets its own randomly-named directory so that stale sockets
/// from a crashed controller can't collide with a fresh one.
pub async fn allocate(base_dir: &Path) -> Result<(PathBuf, UnixListener), SocketError> {
    let dir = base_dir.join(Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|source| SocketError::CreateDir { path: dir.clone(), source })?;

    let path = dir.join(format!("{}.sock", Uuid::new_v4()));
    let listener = UnixListener::bind(&path).map_err(|source| SocketError::Bind { path: path.clone(), source })?;

    Ok((path, listener))
}
