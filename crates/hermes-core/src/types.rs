use hermes_wire::Protocol;
use std::net::IpAddr;

/// A port-forward rule: source `host:port` to a destination port on the
/// backend's remote end, under a specific protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRule {
    pub source_ip: IpAddr,
    pub source_port: u16,
    pub dest_port: u16,
    pub protocol: Protocol,
    /// Re-installed automatically after the owning backend (re)starts.
    pub auto_start: bool,
}

/// A backend's catalog entry, owned by the registry.
#[derive(Debug, Clone)]
pub struct BackendRecord {
    pub id: u32,
    pub name: String,
    pub executable_path: std::path::PathBuf,
    /// Opaque parameter blob handed to `StartBackend` unchanged.
    pub args: Vec<u8>,
    pub proxies: Vec<ProxyRule>,
}

/// The 4-tuple identifying a proxy rule, independent of its `auto_start` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyTarget {
    pub source_ip: IpAddr,
    pub source_port: u16,
    pub dest_port: u16,
    pub protocol: Protocol,
}

impl From<&ProxyRule> for ProxyTarget {
    fn from(rule: &ProxyRule) -> Self {
        Self {
            source_ip: rule.source_ip,
            source_port: rule.source_port,
            dest_port: rule.dest_port,
            protocol: rule.protocol,
        }
    }
}

/// Result of a pure parameter-validation call; never carries side effects.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub is_valid: bool,
    pub message: String,
}

impl CheckResult {
    #[must_use]
    pub fn valid() -> Self {
        Self { is_valid: true, message: String::new() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self { is_valid: false, message: message.into() }
    }
}
