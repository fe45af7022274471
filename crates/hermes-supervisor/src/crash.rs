use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::UnixStream;

/// Invoked exactly once per post-crash reconnect, with the freshly-accepted
/// control connection. Expected to replay whatever state the backend needs
/// (re-issue `Start`, re-add proxies) and hand the stream back so the
/// supervisor's own dispatch loop can take over.
pub type CrashCallback = Arc<dyn Fn(UnixStream) -> Pin<Box<dyn Future<Output = UnixStream> + Send>> + Send + Sync>;
