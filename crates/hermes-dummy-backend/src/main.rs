//! A backend that accepts every request and does nothing. Useful as a
//! supervisor test fixture and as a template for new backend implementations.

use async_trait::async_trait;
use hermes_core::{BackendError, BackendImplementation, CheckResult, ClientConnection, ProxyTarget};
use std::sync::Arc;

#[derive(Debug, Default)]
struct DummyBackend;

impl DummyBackend {
    /// If `HERMES_DUMMY_CRASH_MARKER` names a path that doesn't exist yet,
    /// creates it and exits the process immediately, simulating a single
    /// backend crash for supervisor crash-recovery tests. A no-op once the
    /// marker exists (i.e. on every respawn after the first).
    fn maybe_crash_once() {
        let Ok(marker) = std::env::var("HERMES_DUMMY_CRASH_MARKER") else {
            return;
        };
        let path = std::path::Path::new(&marker);
        if path.exists() {
            return;
        }
        let _ = std::fs::write(path, b"crashed");
        std::process::exit(1);
    }
}

#[async_trait]
impl BackendImplementation for DummyBackend {
    async fn start_backend(&self, _args: &[u8]) -> Result<bool, BackendError> {
        Ok(true)
    }

    async fn stop_backend(&self) -> Result<bool, BackendError> {
        Ok(true)
    }

    async fn backend_status(&self) -> Result<bool, BackendError> {
        Self::maybe_crash_once();
        Ok(true)
    }

    async fn start_proxy(&self, _target: ProxyTarget) -> Result<bool, BackendError> {
        Ok(true)
    }

    async fn stop_proxy(&self, _target: ProxyTarget) -> Result<bool, BackendError> {
        Ok(true)
    }

    async fn client_connections(&self) -> Vec<ClientConnection> {
        Vec::new()
    }

    async fn check_client_parameters(&self, _target: ProxyTarget) -> CheckResult {
        CheckResult {
            message: "Valid!".to_string(),
            ..CheckResult::valid()
        }
    }

    async fn check_server_parameters(&self, _args: &[u8]) -> CheckResult {
        CheckResult {
            message: "Valid!".to_string(),
            ..CheckResult::valid()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    hermes_support::logging::init("HERMES_LOG_LEVEL");

    let socket_path = hermes_child::socket_path_from_env("HERMES_API_SOCK")?;
    let backend: Arc<dyn BackendImplementation> = Arc::new(DummyBackend);

    hermes_child::run(&socket_path, backend).await?;
    Ok(())
}
