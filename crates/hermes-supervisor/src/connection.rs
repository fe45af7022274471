use crate::buffer::Envelope;
use crate::error::SubmitError;
use crate::state::SupervisorState;
use crate::supervisor::Inner;
use hermes_wire::Message;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tokio_util::io::SyncIoBridge;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);
const RESTART_SIGNAL_TIMEOUT: Duration = Duration::from_millis(500);
const DISPATCH_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Accepts control connections one at a time for the lifetime of the
/// supervisor. Each accepted connection gets its own dispatch loop and
/// keep-alive loop; when either exits (write failure, bad reply, keep-alive
/// timeout) the connection is torn down and the loop goes back to accepting,
/// trusting the spawn loop to eventually produce a fresh one.
pub(crate) async fn accept_loop(
    inner: Arc<Inner>,
    listener: UnixListener,
    mut restart_rx: mpsc::Receiver<bool>,
    cancel: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            result = listener.accept() => result,
            () = cancel.cancelled() => return,
        };

        let mut stream = match accepted {
            Ok((stream, _addr)) => stream,
            Err(err) => {
                warn!(error = %err, "failed to accept control connection");
                continue;
            }
        };

        // A reply within the timeout tells us whether this is the first
        // connection (false) or a post-crash reconnect (true); a timeout
        // means the spawn loop hasn't signaled anything new, so treat this
        // as the steady-state case.
        let is_restart = matches!(
            tokio::time::timeout(RESTART_SIGNAL_TIMEOUT, restart_rx.recv()).await,
            Ok(Some(true))
        );

        if is_restart {
            *inner.state.lock().await = SupervisorState::Reconnecting;
            if let Some(on_crash) = inner.on_crash.clone() {
                stream = on_crash(stream).await;
            }
            inner.buffer.drain_with_error(|| SubmitError::ConnectionReset).await;
        }

        *inner.state.lock().await = SupervisorState::Connected;

        let (read_half, write_half) = stream.into_split();
        let conn_cancel = CancellationToken::new();

        let dispatch_task = tokio::spawn(dispatch_loop(inner.clone(), read_half, write_half, conn_cancel.clone()));
        let keepalive_task = tokio::spawn(keepalive_loop(inner.clone(), conn_cancel.clone()));

        tokio::select! {
            _ = dispatch_task => {}
            _ = keepalive_task => {}
            () = cancel.cancelled() => {}
        }
        conn_cancel.cancel();

        if cancel.is_cancelled() {
            return;
        }
    }
}

/// Services one control connection: claim a queued request, write it,
/// decode exactly one response, deliver it, repeat. Exits (and cancels the
/// sibling keep-alive loop) on the first I/O or decode error.
async fn dispatch_loop(inner: Arc<Inner>, read_half: OwnedReadHalf, mut write_half: OwnedWriteHalf, cancel: CancellationToken) {
    let mut bridge = SyncIoBridge::new(read_half);

    loop {
        let envelope = tokio::select! {
            () = cancel.cancelled() => return,
            envelope = next_envelope(&inner) => envelope,
        };

        let Envelope { message, reply } = envelope;

        let encoded = match message.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                let _ = reply.send(Err(err.into()));
                continue;
            }
        };

        if let Err(err) = write_half.write_all(&encoded).await {
            let _ = reply.send(Err(SubmitError::Io(err.to_string())));
            cancel.cancel();
            return;
        }

        let blocking_result = tokio::task::spawn_blocking(move || {
            let result = Message::decode(&mut bridge);
            (bridge, result)
        })
        .await;

        let (returned_bridge, decoded) = match blocking_result {
            Ok(pair) => pair,
            Err(join_err) => {
                let _ = reply.send(Err(SubmitError::Io(join_err.to_string())));
                cancel.cancel();
                return;
            }
        };
        bridge = returned_bridge;

        match decoded {
            Ok(response) => {
                let _ = reply.send(Ok(response));
            }
            Err(err) => {
                let _ = reply.send(Err(err.into()));
                cancel.cancel();
                return;
            }
        }
    }
}

async fn next_envelope(inner: &Inner) -> Envelope {
    loop {
        if let Some(envelope) = inner.buffer.take_one().await {
            return envelope;
        }
        tokio::time::sleep(DISPATCH_POLL_INTERVAL).await;
    }
}

/// Every 5s, submits a `BackendStatusRequest` through the same buffer the
/// dispatch loop services. A non-`BackendStatusResponse` reply or a submit
/// error is treated as a dead connection and tears it down.
async fn keepalive_loop(inner: Arc<Inner>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(KEEPALIVE_INTERVAL) => {}
        }

        match inner.buffer.submit(Message::BackendStatusRequest).await {
            Ok(Message::BackendStatusResponse { is_running, .. }) => {
                if !is_running {
                    debug!("keep-alive probe: backend reports not running");
                }
            }
            Ok(other) => {
                warn!(tag = other.tag(), "keep-alive probe got an unexpected reply, tearing down connection");
                cancel.cancel();
                return;
            }
            Err(err) => {
                warn!(error = %err, "keep-alive probe failed, tearing down connection");
                cancel.cancel();
                return;
            }
        }
    }
}
