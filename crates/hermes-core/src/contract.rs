//! The capability set every concrete backend must satisfy.

use crate::error::BackendError;
use crate::types::{CheckResult, ProxyTarget};
use async_trait::async_trait;
use hermes_wire::ClientConnection;
use std::fmt;

/// Everything a backend child process runs behind the protocol loop.
///
/// Implementations own one backend's connection state (an SSH session, a
/// WireGuard peer, whatever the transport is) and must tolerate being driven
/// by a single-threaded dispatch loop: at most one of these methods is ever
/// in flight at a time from the loop's perspective, but `start_proxy` and
/// `stop_proxy` must still be safe to call concurrently with themselves for
/// different tuples, since the implementation may spawn its own background
/// tasks (e.g. accept loops) that call back into shared state.
#[async_trait]
pub trait BackendImplementation: Send + Sync + fmt::Debug {
    /// Idempotent initialization from an opaque parameter blob. `Ok(true)`
    /// iff the backend is now operational.
    async fn start_backend(&self, args: &[u8]) -> Result<bool, BackendError>;

    /// Orderly teardown. After `Ok(true)`, `backend_status` reports `false`.
    async fn stop_backend(&self) -> Result<bool, BackendError>;

    /// Fast, non-blocking liveness probe.
    async fn backend_status(&self) -> Result<bool, BackendError>;

    /// Begin forwarding as specified by `target`.
    async fn start_proxy(&self, target: ProxyTarget) -> Result<bool, BackendError>;

    /// Stop a previously started proxy. `Ok(false)` if no such proxy exists.
    async fn stop_proxy(&self, target: ProxyTarget) -> Result<bool, BackendError>;

    /// Current snapshot of client connections; safe to call concurrently
    /// with proxying.
    async fn client_connections(&self) -> Vec<ClientConnection>;

    /// Pure validation of a proposed proxy target; no side effects.
    async fn check_client_parameters(&self, target: ProxyTarget) -> CheckResult;

    /// Pure validation of a proposed backend parameter blob; no side effects.
    async fn check_server_parameters(&self, args: &[u8]) -> CheckResult;
}
