use crate::error::SshBackendError;
use serde::Deserialize;
use validator::Validate;

/// Parameters passed to `StartBackend`, JSON-encoded. Mirrors the reference
/// implementation's field names so existing manifests keep working.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SshBackendData {
    #[validate(length(min = 1))]
    pub ip: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[validate(length(min = 1))]
    pub username: String,
    #[serde(rename = "privateKey")]
    #[validate(length(min = 1))]
    pub private_key: String,
    #[serde(rename = "listenOnIPs", default)]
    pub listen_on_ips: Vec<String>,
}

impl SshBackendData {
    pub fn parse(bytes: &[u8]) -> Result<Self, SshBackendError> {
        let mut data: Self = serde_json::from_slice(bytes).map_err(|err| SshBackendError::InvalidParameters(err.to_string()))?;
        data.validate().map_err(|err| SshBackendError::InvalidParameters(err.to_string()))?;
        if data.listen_on_ips.is_empty() {
            data.listen_on_ips.push("0.0.0.0".to_string());
        }
        Ok(data)
    }
}
