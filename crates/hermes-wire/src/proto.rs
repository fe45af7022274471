use crate::error::WireError;

// Message tag IDs. Order matches the historical wire format; do not renumber.
pub(crate) const START: u8 = 0;
pub(crate) const STOP: u8 = 1;
pub(crate) const ADD_PROXY: u8 = 2;
pub(crate) const REMOVE_PROXY: u8 = 3;
pub(crate) const PROXY_CONNECTIONS_RESPONSE: u8 = 4;
pub(crate) const CHECK_CLIENT_PARAMETERS: u8 = 5;
pub(crate) const CHECK_SERVER_PARAMETERS: u8 = 6;
pub(crate) const CHECK_PARAMETERS_RESPONSE: u8 = 7;
pub(crate) const PROXY_CONNECTIONS_REQUEST: u8 = 8;
pub(crate) const BACKEND_STATUS_RESPONSE: u8 = 9;
pub(crate) const BACKEND_STATUS_REQUEST: u8 = 10;
pub(crate) const PROXY_STATUS_REQUEST: u8 = 11;
pub(crate) const PROXY_STATUS_RESPONSE: u8 = 12;
pub(crate) const PROXY_INSTANCE_RESPONSE: u8 = 13;
pub(crate) const PROXY_INSTANCE_REQUEST: u8 = 14;

pub(crate) const IPV4: u8 = 4;
pub(crate) const IPV6: u8 = 6;

/// Transport protocol a proxy rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            Protocol::Tcp => 0,
            Protocol::Udp => 1,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Result<Self, WireError> {
        match byte {
            0 => Ok(Protocol::Tcp),
            1 => Ok(Protocol::Udp),
            other => Err(WireError::UnknownProtocol(other)),
        }
    }

    pub(crate) fn parse_name(name: &str) -> Result<Self, WireError> {
        match name {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(WireError::InvalidProtocolName(other.to_string())),
        }
    }
}

/// Outcome byte carried by `BackendStatusResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Success,
    Failure,
}

impl StatusCode {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            StatusCode::Success => 0,
            StatusCode::Failure => 1,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Self {
        if byte == 0 { StatusCode::Success } else { StatusCode::Failure }
    }
}

/// Which request a `CheckParametersResponse` answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsTarget {
    Client,
    Server,
}

impl ParamsTarget {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            ParamsTarget::Client => CHECK_CLIENT_PARAMETERS,
            ParamsTarget::Server => CHECK_SERVER_PARAMETERS,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Result<Self, WireError> {
        match byte {
            CHECK_CLIENT_PARAMETERS => Ok(ParamsTarget::Client),
            CHECK_SERVER_PARAMETERS => Ok(ParamsTarget::Server),
            other => Err(WireError::UnknownInResponseTo(other)),
        }
    }
}
