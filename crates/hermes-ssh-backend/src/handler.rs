use hermes_core::{ClientConnection, ProxyTarget};
use russh::client::{Handler, Msg, Session};
use russh::Channel;
use russh_keys::key::PublicKey;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

/// Keyed by the remote (listen-ip, dest-port) pair a `tcpip-forward` request
/// was opened on, so an incoming `forwarded-tcpip` channel can be matched
/// back to the local address it should dial into.
pub(crate) type TargetMap = Arc<RwLock<HashMap<(String, u16), ProxyTarget>>>;
pub(crate) type ClientList = Arc<Mutex<Vec<ClientConnection>>>;

/// The SSH client-side event sink. Host key checking always accepts, mirroring
/// the reference backend's `InsecureIgnoreHostKey`; the one event this crate
/// cares about is a forwarded connection arriving for a proxy we registered.
pub(crate) struct ClientHandler {
    pub targets: TargetMap,
    pub clients: ClientList,
}

#[async_trait::async_trait]
impl Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, _server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        Ok(true)
    }

    async fn server_channel_open_forwarded_tcpip(
        &mut self,
        channel: Channel<Msg>,
        connected_address: &str,
        connected_port: u32,
        originator_address: &str,
        originator_port: u32,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        let key = (connected_address.to_string(), connected_port as u16);
        let target = self.targets.read().await.get(&key).copied();

        let Some(target) = target else {
            warn!(address = %connected_address, port = %connected_port, "forwarded connection for an unregistered proxy, dropping");
            return Ok(());
        };

        let clients = self.clients.clone();
        let originator_address = originator_address.to_string();

        tokio::spawn(async move {
            splice(channel, target, originator_address, originator_port as u16, clients).await;
        });

        Ok(())
    }
}

async fn splice(channel: Channel<Msg>, target: ProxyTarget, originator_address: String, originator_port: u16, clients: ClientList) {
    let source_addr = match target.source_ip {
        IpAddr::V4(ip) => format!("{ip}:{}", target.source_port),
        IpAddr::V6(ip) => format!("[{ip}]:{}", target.source_port),
    };

    let mut source_conn = match TcpStream::connect(&source_addr).await {
        Ok(conn) => conn,
        Err(err) => {
            warn!(address = %source_addr, error = %err, "failed to dial source connection for forwarded proxy");
            return;
        }
    };

    let client_ip: IpAddr = originator_address.parse().unwrap_or(IpAddr::from([0, 0, 0, 0]));
    let entry = ClientConnection {
        source_ip: target.source_ip,
        source_port: target.source_port,
        dest_port: target.dest_port,
        client_ip,
        client_port: originator_port,
    };

    clients.lock().await.push(entry.clone());

    let mut remote = channel.into_stream();
    let _ = tokio::io::copy_bidirectional_with_sizes(&mut source_conn, &mut remote, 65536, 65536).await;

    let mut guard = clients.lock().await;
    if let Some(index) = guard.iter().position(|c| *c == entry) {
        guard.remove(index);
    }
}
