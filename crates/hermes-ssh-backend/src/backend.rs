use crate::config::SshBackendData;
use crate::error::SshBackendError;
use crate::handler::{ClientHandler, ClientList, TargetMap};
use async_trait::async_trait;
use hermes_core::{BackendError, BackendImplementation, CheckResult, ClientConnection, ProxyTarget};
use russh::client::{self, Handle};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{error, info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Reference backend: forwards each registered proxy to the configured SSH
/// server's remote-forward listeners, splicing inbound connections back to
/// the locally-dialed source address. A background watchdog (see
/// [`run_watchdog`]) reconnects on disconnect and replays every
/// currently-registered proxy, the same way the original does.
pub struct SshBackend {
    config: Mutex<Option<SshBackendData>>,
    session: Mutex<Option<Handle<ClientHandler>>>,
    /// Notified every time `session` goes from `None` to `Some`, so the
    /// watchdog can wake up and start watching the new session for close
    /// instead of polling for one to appear.
    connected: Notify,
    targets: TargetMap,
    clients: ClientList,
    proxies: Mutex<Vec<ProxyTarget>>,
}

impl Default for SshBackend {
    fn default() -> Self {
        Self {
            config: Mutex::new(None),
            session: Mutex::new(None),
            connected: Notify::new(),
            targets: Arc::new(RwLock::new(HashMap::new())),
            clients: Arc::new(Mutex::new(Vec::new())),
            proxies: Mutex::new(Vec::new()),
        }
    }
}

impl std::fmt::Debug for SshBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshBackend").finish()
    }
}

async fn dial(config: &SshBackendData, targets: TargetMap, clients: ClientList) -> Result<Handle<ClientHandler>, SshBackendError> {
    let key_pair = russh_keys::decode_secret_key(&config.private_key, None)
        .map_err(|err| SshBackendError::PrivateKey(err.to_string()))?;

    let ssh_config = Arc::new(client::Config::default());
    let handler = ClientHandler { targets, clients };

    let mut handle = client::connect(ssh_config, (config.ip.as_str(), config.port), handler)
        .await
        .map_err(|source| SshBackendError::Connect { host: config.ip.clone(), port: config.port, source })?;

    let authenticated = handle
        .authenticate_publickey(&config.username, Arc::new(key_pair))
        .await
        .map_err(|source| SshBackendError::Connect { host: config.ip.clone(), port: config.port, source })?;

    if !authenticated {
        return Err(SshBackendError::Connect { host: config.ip.clone(), port: config.port, source: russh::Error::NotAuthenticated });
    }

    Ok(handle)
}

impl SshBackend {
    async fn bind_forward(&self, target: ProxyTarget) -> Result<(), SshBackendError> {
        let config = self.config.lock().await.clone().ok_or(SshBackendError::NotStarted)?;
        let mut guard = self.session.lock().await;
        let handle = guard.as_mut().ok_or(SshBackendError::NotStarted)?;

        for listen_ip in &config.listen_on_ips {
            handle
                .tcpip_forward(listen_ip, u32::from(target.dest_port))
                .await
                .map_err(|source| SshBackendError::Forward { ip: listen_ip.clone(), port: target.dest_port, source })?;

            self.targets.write().await.insert((listen_ip.clone(), target.dest_port), target);
        }

        Ok(())
    }

    async fn unbind_forward(&self, target: ProxyTarget) -> Result<(), SshBackendError> {
        let config = self.config.lock().await.clone().ok_or(SshBackendError::NotStarted)?;
        let mut guard = self.session.lock().await;
        let handle = guard.as_mut().ok_or(SshBackendError::NotStarted)?;

        for listen_ip in &config.listen_on_ips {
            let _ = handle.cancel_tcpip_forward(listen_ip, u32::from(target.dest_port)).await;
            self.targets.write().await.remove(&(listen_ip.clone(), target.dest_port));
        }

        Ok(())
    }
}

#[async_trait]
impl BackendImplementation for SshBackend {
    async fn start_backend(&self, args: &[u8]) -> Result<bool, BackendError> {
        info!("SSHBackend is initializing...");
        let data = SshBackendData::parse(args).map_err(BackendError::from)?;
        let handle = dial(&data, self.targets.clone(), self.clients.clone()).await.map_err(BackendError::from)?;

        *self.config.lock().await = Some(data);
        *self.session.lock().await = Some(handle);
        self.connected.notify_one();

        info!("SSHBackend has initialized successfully.");
        Ok(true)
    }

    async fn stop_backend(&self) -> Result<bool, BackendError> {
        *self.config.lock().await = None;
        let Some(handle) = self.session.lock().await.take() else {
            return Ok(true);
        };
        let _ = handle.disconnect(russh::Disconnect::ByApplication, "", "").await;
        Ok(true)
    }

    async fn backend_status(&self) -> Result<bool, BackendError> {
        let guard = self.session.lock().await;
        Ok(guard.as_ref().is_some_and(|handle| !handle.is_closed()))
    }

    async fn start_proxy(&self, target: ProxyTarget) -> Result<bool, BackendError> {
        self.bind_forward(target).await.map_err(BackendError::from)?;
        self.proxies.lock().await.push(target);
        Ok(true)
    }

    async fn stop_proxy(&self, target: ProxyTarget) -> Result<bool, BackendError> {
        let mut proxies = self.proxies.lock().await;
        let Some(index) = proxies.iter().position(|p| *p == target) else {
            return Ok(false);
        };
        proxies.remove(index);
        drop(proxies);

        self.unbind_forward(target).await.map_err(BackendError::from)?;
        Ok(true)
    }

    async fn client_connections(&self) -> Vec<ClientConnection> {
        self.clients.lock().await.clone()
    }

    async fn check_client_parameters(&self, target: ProxyTarget) -> CheckResult {
        if target.protocol != hermes_wire::Protocol::Tcp {
            return CheckResult::invalid("Only TCP is supported for SSH");
        }
        CheckResult::valid()
    }

    async fn check_server_parameters(&self, args: &[u8]) -> CheckResult {
        match SshBackendData::parse(args) {
            Ok(_) => CheckResult::valid(),
            Err(err) => CheckResult::invalid(err.to_string()),
        }
    }
}

/// Runs forever in the background. Mirrors the reference backend's
/// `backendDisconnectHandler`, which blocks on `conn.Wait()` rather than
/// polling: this waits on [`Handle::closed`] directly, reconnecting (with
/// every previously registered proxy replayed) the moment the session ends.
/// Only acts once `start_backend` has run.
pub async fn run_watchdog(backend: Arc<SshBackend>) {
    loop {
        let handle = backend.session.lock().await.clone();

        let Some(handle) = handle else {
            backend.connected.notified().await;
            continue;
        };

        handle.closed().await;

        // `stop_backend` clears the session before disconnecting, so a
        // cleared config means this was a deliberate stop, not a crash.
        let Some(config) = backend.config.lock().await.clone() else {
            continue;
        };

        warn!("SSH connection dropped, reconnecting in 5 seconds...");
        tokio::time::sleep(RECONNECT_DELAY).await;

        match dial(&config, backend.targets.clone(), backend.clients.clone()).await {
            Ok(handle) => {
                *backend.session.lock().await = Some(handle);
                backend.connected.notify_one();

                info!("reconnected to SSH server, replaying proxies");
                let proxies = backend.proxies.lock().await.clone();
                for target in proxies {
                    if let Err(err) = backend.bind_forward(target).await {
                        error!(error = %err, "failed to replay proxy after reconnect");
                    }
                }
            }
            Err(err) => {
                error!(error = %err, "failed to reconnect to SSH server, will retry");
            }
        }
    }
}
