mod backend;
mod config;
mod error;
mod handler;

use backend::SshBackend;
use hermes_core::BackendImplementation;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hermes_support::logging::init("HERMES_LOG_LEVEL");

    let socket_path = hermes_child::socket_path_from_env("HERMES_API_SOCK")?;
    let backend = Arc::new(SshBackend::default());

    tokio::spawn(backend::run_watchdog(backend.clone()));

    let backend: Arc<dyn BackendImplementation> = backend;
    hermes_child::run(&socket_path, backend).await?;
    Ok(())
}
