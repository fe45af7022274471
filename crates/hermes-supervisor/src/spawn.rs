use crate::state::SupervisorState;
use crate::supervisor::Inner;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const RESTART_DELAY: Duration = Duration::from_secs(5);

/// Spawns the backend child, waits for it to exit, and respawns it after a
/// fixed delay, for as long as `cancel` hasn't fired. Notifies the accept
/// loop on `restart_tx` after every respawn so it can treat the next
/// connection as a post-crash reconnect.
pub(crate) async fn spawn_loop(
    inner: Arc<Inner>,
    socket_path: PathBuf,
    restart_tx: mpsc::Sender<bool>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            return;
        }

        let mut command = Command::new(&inner.executable_path);
        command
            .env(&inner.socket_env_var, &socket_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Ok(level) = std::env::var(&inner.log_level_env_var) {
            command.env(&inner.log_level_env_var, level);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(error = %err, path = %inner.executable_path.display(), "failed to spawn backend child, retrying in 5s");
                if sleep_or_cancelled(RESTART_DELAY, &cancel).await {
                    return;
                }
                continue;
            }
        };

        if let Some(stdout) = child.stdout.take() {
            spawn_log_reader(inner.clone(), stdout, false);
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_log_reader(inner.clone(), stderr, true);
        }

        tokio::select! {
            status = child.wait() => {
                match status {
                    Ok(status) => match status.code() {
                        Some(0 | -1) | None => debug!(%status, "backend child exited"),
                        Some(_) => warn!(%status, "backend child exited with a non-zero status"),
                    },
                    Err(err) => warn!(error = %err, "failed to wait on backend child"),
                }
            }
            () = cancel.cancelled() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return;
            }
        }

        if cancel.is_cancelled() {
            return;
        }

        *inner.state.lock().await = SupervisorState::Reconnecting;

        if sleep_or_cancelled(RESTART_DELAY, &cancel).await {
            return;
        }

        // Best effort: if the accept loop hasn't drained the previous
        // notification yet (shouldn't happen with a capacity-1 channel and a
        // well-behaved accept loop), this silently drops rather than blocks.
        let _ = restart_tx.try_send(true);
    }
}

async fn sleep_or_cancelled(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = tokio::time::sleep(duration) => false,
        () = cancel.cancelled() => true,
    }
}

fn spawn_log_reader(inner: Arc<Inner>, pipe: impl AsyncRead + Unpin + Send + 'static, is_stderr: bool) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            inner.logs.push(is_stderr, line).await;
        }
    });
}
