use async_trait::async_trait;
use hermes_core::{BackendError, BackendImplementation, CheckResult, ClientConnection, ProxyTarget};
use hermes_wire::{Message, Protocol, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

#[derive(Debug, Default)]
struct AlwaysSucceedsBackend {
    running: AtomicBool,
}

#[async_trait]
impl BackendImplementation for AlwaysSucceedsBackend {
    async fn start_backend(&self, _args: &[u8]) -> Result<bool, BackendError> {
        self.running.store(true, Ordering::SeqCst);
        Ok(true)
    }

    async fn stop_backend(&self) -> Result<bool, BackendError> {
        self.running.store(false, Ordering::SeqCst);
        Ok(true)
    }

    async fn backend_status(&self) -> Result<bool, BackendError> {
        Ok(self.running.load(Ordering::SeqCst))
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
        CheckResult::valid()
    }

    async fn check_server_parameters(&self, _args: &[u8]) -> CheckResult {
        CheckResult::valid()
    }
}

async fn write_request(stream: &mut UnixStream, msg: &Message) {
    stream.write_all(&msg.encode().unwrap()).await.unwrap();
}

async fn read_response(stream: &mut UnixStream) -> Message {
    // Each response in this test fits comfortably in one read; the helper
    // loop writes exactly one frame per request.
    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).await.unwrap();
    Message::decode(&mut std::io::Cursor::new(&buf[..n])).unwrap()
}

#[tokio::test]
async fn start_then_add_proxy_then_connections() {
    let (controller_side, child_side) = UnixStream::pair().unwrap();
    let backend: Arc<dyn BackendImplementation> = Arc::new(AlwaysSucceedsBackend::default());

    let helper = tokio::spawn(async move {
        let (read_half, write_half) = child_side.into_split();
        hermes_child::run_on_split(read_half, write_half, backend).await
    });

    let mut controller_side = controller_side;

    write_request(&mut controller_side, &Message::Start { args: b"hello".to_vec() }).await;
    match read_response(&mut controller_side).await {
        Message::BackendStatusResponse { is_running, status_code, .. } => {
            assert!(is_running);
            assert_eq!(status_code, StatusCode::Success);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    write_request(
        &mut controller_side,
        &Message::AddProxy {
            source_ip: "127.0.0.1".parse().unwrap(),
            source_port: 19132,
            dest_port: 19132,
            protocol: Protocol::Tcp,
        },
    )
    .await;
    match read_response(&mut controller_side).await {
        Message::ProxyStatusResponse { is_active, .. } => assert!(is_active),
        other => panic!("unexpected response: {other:?}"),
    }

    write_request(&mut controller_side, &Message::ProxyConnectionsRequest).await;
    match read_response(&mut controller_side).await {
        Message::ProxyConnectionsResponse { connections } => assert!(connections.is_empty()),
        other => panic!("unexpected response: {other:?}"),
    }

    drop(controller_side);
    let _ = helper.await;
}
