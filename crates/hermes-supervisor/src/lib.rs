#![forbid(unsafe_code)]
//! The controller-side runtime: spawns and supervises backend child
//! processes over a Unix control socket, restarting them on crash and
//! forwarding submitted requests while a connection is live.

mod buffer;
mod connection;
mod crash;
mod error;
mod logring;
mod registry;
mod spawn;
mod state;
mod supervisor;

pub use crash::CrashCallback;
pub use error::{RegistryError, SubmitError, SupervisorError};
pub use logring::LogLine;
pub use registry::{AvailableBackends, BackendEntry, Registry};
pub use state::SupervisorState;
pub use supervisor::{Supervisor, SupervisorConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_wire::Message;
    use std::path::PathBuf;
    use std::time::Duration;

    fn dummy_backend_path() -> std::path::PathBuf {
        // Exercised against the reference always-succeeds backend binary;
        // resolved at the workspace level in integration tests. Unit tests
        // here stick to what doesn't need a real child process.
        std::path::PathBuf::from("/nonexistent/hermes-dummy-backend")
    }

    #[tokio::test]
    async fn stop_before_start_is_not_running() {
        let supervisor = Supervisor::new(SupervisorConfig {
            executable_path: dummy_backend_path(),
            socket_dir: std::env::temp_dir(),
            socket_env_var: "HERMES_API_SOCK".to_string(),
            log_level_env_var: "HERMES_LOG_LEVEL".to_string(),
            on_crash: None,
        });

        assert!(matches!(supervisor.stop().await, Err(SupervisorError::NotRunning)));
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let base = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(SupervisorConfig {
            executable_path: dummy_backend_path(),
            socket_dir: base.path().to_path_buf(),
            socket_env_var: "HERMES_API_SOCK".to_string(),
            log_level_env_var: "HERMES_LOG_LEVEL".to_string(),
            on_crash: None,
        });

        supervisor.start().await.unwrap();
        assert!(matches!(supervisor.start().await, Err(SupervisorError::AlreadyRunning)));
        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn submit_times_out_with_no_connection() {
        let base = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(SupervisorConfig {
            executable_path: dummy_backend_path(),
            socket_dir: base.path().to_path_buf(),
            socket_env_var: "HERMES_API_SOCK".to_string(),
            log_level_env_var: "HERMES_LOG_LEVEL".to_string(),
            on_crash: None,
        });

        // Fill all 10 slots with requests nobody will ever service, then
        // confirm an 11th submit fails after exhausting its retries rather
        // than hanging.
        let mut holders = Vec::new();
        for _ in 0..10 {
            let sup = supervisor.clone();
            holders.push(tokio::spawn(async move { sup.submit(Message::BackendStatusRequest).await }));
        }

        let result = tokio::time::timeout(Duration::from_secs(10), supervisor.submit(Message::BackendStatusRequest)).await;
        assert!(matches!(result, Ok(Err(SubmitError::SchedulingTimeout))));

        for holder in holders {
            holder.abort();
        }
    }

    #[tokio::test]
    async fn registry_rejects_duplicate_ids() {
        let base = tempfile::tempdir().unwrap();
        let registry = Registry::new();
        let supervisor = Supervisor::new(SupervisorConfig {
            executable_path: dummy_backend_path(),
            socket_dir: base.path().to_path_buf(),
            socket_env_var: "HERMES_API_SOCK".to_string(),
            log_level_env_var: "HERMES_LOG_LEVEL".to_string(),
            on_crash: None,
        });

        registry.register("ssh-1".to_string(), supervisor.clone()).await.unwrap();
        assert!(matches!(
            registry.register("ssh-1".to_string(), supervisor).await,
            Err(RegistryError::DuplicateBackend(_))
        ));
        assert_eq!(registry.ids().await, vec!["ssh-1".to_string()]);
    }

    #[tokio::test]
    async fn manifest_loads_backend_entries() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("backends.toml");
        tokio::fs::write(
            &manifest_path,
            "[ssh]\npath = \"/usr/local/bin/hermes-ssh-backend\"\n\n[dummy]\npath = \"/usr/local/bin/hermes-dummy-backend\"\n",
        )
        .await
        .unwrap();

        let available = AvailableBackends::load_manifest(&manifest_path).await.unwrap();
        assert_eq!(available.get("ssh").unwrap().path, PathBuf::from("/usr/local/bin/hermes-ssh-backend"));
        assert!(available.get("missing").is_none());
        let mut names: Vec<_> = available.names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["dummy", "ssh"]);
    }
}
