use crate::buffer::CommandBuffer;
use crate::connection::accept_loop;
use crate::crash::CrashCallback;
use crate::error::{SubmitError, SupervisorError};
use crate::logring::{LogLine, LogRing};
use crate::spawn::spawn_loop;
use crate::state::SupervisorState;
use hermes_wire::Message;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Everything [`Supervisor::new`] needs to know about the backend child it
/// will spawn and reconnect to.
pub struct SupervisorConfig {
    /// Path to the backend child executable.
    pub executable_path: PathBuf,
    /// Directory under which a fresh control-socket directory is allocated.
    pub socket_dir: PathBuf,
    /// Environment variable the child reads its control socket path from.
    pub socket_env_var: String,
    /// Environment variable carrying the log level, propagated unchanged
    /// from the controller's own environment if set.
    pub log_level_env_var: String,
    /// Invoked once per post-crash reconnect; see [`CrashCallback`].
    pub on_crash: Option<CrashCallback>,
}

/// State shared between the spawn loop and the connection loop. Held behind
/// an `Arc` so both background tasks, and the `Supervisor` handle itself, see
/// the same buffer, logs and crash callback.
pub(crate) struct Inner {
    pub executable_path: PathBuf,
    pub socket_env_var: String,
    pub log_level_env_var: String,
    pub buffer: CommandBuffer,
    pub logs: LogRing,
    pub on_crash: Option<CrashCallback>,
    pub state: Mutex<SupervisorState>,
}

struct RunningHandle {
    cancel: CancellationToken,
    spawn_task: JoinHandle<()>,
    connection_task: JoinHandle<()>,
    socket_path: PathBuf,
}

/// Owns one backend child process's lifecycle: spawning it, reconnecting
/// after crashes, and forwarding [`submit`](Supervisor::submit)ed requests
/// over whichever control connection is currently live.
///
/// Mirrors the bind-then-spawn, cancellation-token-driven shape used
/// elsewhere in this codebase for long-running supervised tasks, generalized
/// to a process that must be restarted (rather than just stopped) and to a
/// request/response control channel instead of a plain listener.
pub struct Supervisor {
    inner: Arc<Inner>,
    handle: Mutex<Option<RunningHandle>>,
    socket_dir: PathBuf,
}

impl Supervisor {
    #[must_use]
    pub fn new(config: SupervisorConfig) -> Arc<Self> {
        Arc::new(Self {
            inner: Arc::new(Inner {
                executable_path: config.executable_path,
                socket_env_var: config.socket_env_var,
                log_level_env_var: config.log_level_env_var,
                buffer: CommandBuffer::new(),
                logs: LogRing::new(),
                on_crash: config.on_crash,
                state: Mutex::new(SupervisorState::Idle),
            }),
            handle: Mutex::new(None),
            socket_dir: config.socket_dir,
        })
    }

    /// Allocates a control socket, spawns the backend child, and starts the
    /// background spawn/accept/dispatch/keep-alive loops. Idempotent only in
    /// the sense that calling it twice without an intervening `stop` fails.
    pub async fn start(self: &Arc<Self>) -> Result<(), SupervisorError> {
        let mut guard = self.handle.lock().await;
        if guard.is_some() {
            return Err(SupervisorError::AlreadyRunning);
        }

        *self.inner.state.lock().await = SupervisorState::Starting;

        let (socket_path, listener) = hermes_support::socket::allocate(&self.socket_dir).await?;

        let (restart_tx, restart_rx) = mpsc::channel(1);
        // Sent once, before any connection is accepted: tells the accept
        // loop that the very first connection is not a post-crash reconnect.
        let _ = restart_tx.try_send(false);

        let cancel = CancellationToken::new();

        let spawn_task = tokio::spawn(spawn_loop(self.inner.clone(), socket_path.clone(), restart_tx, cancel.clone()));
        let connection_task = tokio::spawn(accept_loop(self.inner.clone(), listener, restart_rx, cancel.clone()));

        *guard = Some(RunningHandle {
            cancel,
            spawn_task,
            connection_task,
            socket_path,
        });

        Ok(())
    }

    /// Cancels the background loops, kills the current backend child if one
    /// is running, fails any in-flight `submit`s, and removes the control
    /// socket. Returns [`SupervisorError::NotRunning`] if already stopped.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        let mut guard = self.handle.lock().await;
        let running = guard.take().ok_or(SupervisorError::NotRunning)?;
        drop(guard);

        running.cancel.cancel();
        let _ = running.spawn_task.await;
        let _ = running.connection_task.await;

        self.inner.buffer.drain_with_error(|| SubmitError::ConnectionReset).await;
        *self.inner.state.lock().await = SupervisorState::Stopped;

        let _ = tokio::fs::remove_file(&running.socket_path).await;
        if let Some(parent) = running.socket_path.parent() {
            let _ = tokio::fs::remove_dir(parent).await;
        }

        Ok(())
    }

    /// Schedules `message` on the current (or next) control connection and
    /// awaits its response. Fails after 50 retries, 100ms apart, if the
    /// bounded command buffer stays full that whole time.
    pub async fn submit(&self, message: Message) -> Result<Message, SubmitError> {
        self.inner.buffer.submit(message).await
    }

    pub async fn state(&self) -> SupervisorState {
        *self.inner.state.lock().await
    }

    /// Snapshot of recent backend stdout/stderr lines, oldest first.
    pub async fn logs(&self) -> Vec<LogLine> {
        self.inner.logs.snapshot().await
    }

    pub async fn is_running(&self) -> bool {
        self.handle.lock().await.is_some()
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor").field("executable_path", &self.inner.executable_path).finish()
    }
}
