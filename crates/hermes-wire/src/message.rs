use crate::error::WireError;
use crate::io::{
    push_ip, push_length_prefixed, read_ip, read_ip_with_version, read_length_prefixed,
    read_length_prefixed_string, read_u8, read_u16,
};
use crate::proto::{self, ParamsTarget, Protocol, StatusCode};
use std::io::Read;
use std::net::IpAddr;

/// A client connected through a running proxy, as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConnection {
    pub source_ip: IpAddr,
    pub source_port: u16,
    pub dest_port: u16,
    pub client_ip: IpAddr,
    pub client_port: u16,
}

/// A proxy rule as reported back by `ProxyInstanceResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyInstance {
    pub source_ip: IpAddr,
    pub source_port: u16,
    pub dest_port: u16,
    pub protocol: Protocol,
}

/// One framed message on the backend control connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Start {
        args: Vec<u8>,
    },
    Stop,
    AddProxy {
        source_ip: IpAddr,
        source_port: u16,
        dest_port: u16,
        protocol: Protocol,
    },
    RemoveProxy {
        source_ip: IpAddr,
        source_port: u16,
        dest_port: u16,
        protocol: Protocol,
    },
    ProxyConnectionsResponse {
        connections: Vec<ClientConnection>,
    },
    CheckClientParameters {
        source_ip: IpAddr,
        source_port: u16,
        dest_port: u16,
        protocol: Protocol,
    },
    CheckServerParameters {
        args: Vec<u8>,
    },
    CheckParametersResponse {
        in_response_to: ParamsTarget,
        is_valid: bool,
        message: String,
    },
    ProxyConnectionsRequest,
    BackendStatusResponse {
        is_running: bool,
        status_code: StatusCode,
        message: String,
    },
    BackendStatusRequest,
    ProxyStatusRequest {
        source_ip: IpAddr,
        source_port: u16,
        dest_port: u16,
        protocol: Protocol,
    },
    ProxyStatusResponse {
        source_ip: IpAddr,
        source_port: u16,
        dest_port: u16,
        protocol: Protocol,
        is_active: bool,
    },
    ProxyInstanceResponse {
        proxies: Vec<ProxyInstance>,
    },
    ProxyInstanceRequest,
}

fn push_four_tuple(out: &mut Vec<u8>, source_ip: &IpAddr, source_port: u16, dest_port: u16, protocol: Protocol) {
    push_ip(out, source_ip);
    out.extend_from_slice(&source_port.to_be_bytes());
    out.extend_from_slice(&dest_port.to_be_bytes());
    out.push(protocol.to_byte());
}

fn read_four_tuple(reader: &mut impl Read) -> Result<(IpAddr, u16, u16, Protocol), WireError> {
    let source_ip = read_ip(reader)?;
    let source_port = read_u16(reader)?;
    let dest_port = read_u16(reader)?;
    let protocol = Protocol::from_byte(read_u8(reader)?)?;
    Ok((source_ip, source_port, dest_port, protocol))
}

pub(crate) fn encode_connection(conn: &ClientConnection) -> Vec<u8> {
    let mut out = Vec::new();
    push_ip(&mut out, &conn.source_ip);
    out.extend_from_slice(&conn.source_port.to_be_bytes());
    out.extend_from_slice(&conn.dest_port.to_be_bytes());
    push_ip(&mut out, &conn.client_ip);
    out.extend_from_slice(&conn.client_port.to_be_bytes());
    out
}

fn decode_connection_with_version(reader: &mut impl Read, server_ip_version: u8) -> Result<ClientConnection, WireError> {
    let source_ip = read_ip_with_version(reader, server_ip_version)?;
    let source_port = read_u16(reader)?;
    let dest_port = read_u16(reader)?;
    let client_ip = read_ip(reader)?;
    let client_port = read_u16(reader)?;
    Ok(ClientConnection {
        source_ip,
        source_port,
        dest_port,
        client_ip,
        client_port,
    })
}

fn encode_proxy_instance(proxy: &ProxyInstance) -> Vec<u8> {
    let mut out = Vec::new();
    push_ip(&mut out, &proxy.source_ip);
    out.extend_from_slice(&proxy.source_port.to_be_bytes());
    out.extend_from_slice(&proxy.dest_port.to_be_bytes());
    out.push(proxy.protocol.to_byte());
    out
}

fn decode_proxy_instance_with_version(reader: &mut impl Read, ip_version: u8) -> Result<ProxyInstance, WireError> {
    let source_ip = read_ip_with_version(reader, ip_version)?;
    let source_port = read_u16(reader)?;
    let dest_port = read_u16(reader)?;
    let protocol = Protocol::from_byte(read_u8(reader)?)?;
    Ok(ProxyInstance {
        source_ip,
        source_port,
        dest_port,
        protocol,
    })
}

/// Encodes a CR-separated, LF-terminated sequence. An empty sequence still
/// emits one `\r` placeholder before the `\n`, so the trailer is always at
/// least two bytes (see the sequence note in the wire grammar).
fn encode_sequence<T>(elements: &[T], encode_one: impl Fn(&T) -> Vec<u8>) -> Vec<u8> {
    let mut out = Vec::new();
    if elements.is_empty() {
        out.push(b'\r');
        out.push(b'\n');
        return out;
    }
    for element in elements {
        out.extend_from_slice(&encode_one(element));
        out.push(b'\r');
    }
    *out.last_mut().unwrap() = b'\n';
    out
}

/// Decodes a CR-separated, LF-terminated sequence, tolerating the empty-sequence
/// placeholder (`\r\n` or a bare `\n` right after the tag). On a malformed
/// delimiter, returns the elements parsed so far alongside the error.
fn decode_sequence<T>(
    reader: &mut impl Read,
    decode_one: impl Fn(&mut dyn Read, u8) -> Result<T, WireError>,
) -> (Vec<T>, Option<WireError>) {
    let mut elements = Vec::new();

    let mut lead = match read_u8(reader) {
        Ok(byte) => byte,
        Err(err) => return (elements, Some(err)),
    };

    if lead == b'\n' {
        return (elements, None);
    }
    if lead == b'\r' {
        return match read_u8(reader) {
            Ok(b'\n') => (elements, None),
            Ok(_) => (elements, Some(WireError::BadDelimiter(0))),
            Err(err) => (elements, Some(err)),
        };
    }

    loop {
        match decode_one(reader, lead) {
            Ok(element) => elements.push(element),
            Err(err) => return (elements, Some(err)),
        }

        match read_u8(reader) {
            Ok(b'\r') => match read_u8(reader) {
                Ok(next_lead) => lead = next_lead,
                Err(err) => return (elements, Some(err)),
            },
            Ok(b'\n') => return (elements, None),
            Ok(_) => return (elements, Some(WireError::BadDelimiter(elements.len()))),
            Err(err) => return (elements, Some(err)),
        }
    }
}

/// Decodes a `ProxyConnectionsResponse` body, exposed separately from
/// [`Message::decode`] so callers can inspect a partial parse after a bad
/// delimiter (see the decoder-robustness property in the wire grammar).
pub fn decode_proxy_connections(reader: &mut impl Read) -> (Vec<ClientConnection>, Option<WireError>) {
    decode_sequence(reader, |r, lead| decode_connection_with_version(r, lead))
}

/// Decodes a `ProxyInstanceResponse` body; see [`decode_proxy_connections`].
pub fn decode_proxy_instances(reader: &mut impl Read) -> (Vec<ProxyInstance>, Option<WireError>) {
    decode_sequence(reader, |r, lead| decode_proxy_instance_with_version(r, lead))
}

impl Message {
    /// The tag byte this message is framed with on the wire.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Message::Start { .. } => proto::START,
            Message::Stop => proto::STOP,
            Message::AddProxy { .. } => proto::ADD_PROXY,
            Message::RemoveProxy { .. } => proto::REMOVE_PROXY,
            Message::ProxyConnectionsResponse { .. } => proto::PROXY_CONNECTIONS_RESPONSE,
            Message::CheckClientParameters { .. } => proto::CHECK_CLIENT_PARAMETERS,
            Message::CheckServerParameters { .. } => proto::CHECK_SERVER_PARAMETERS,
            Message::CheckParametersResponse { .. } => proto::CHECK_PARAMETERS_RESPONSE,
            Message::ProxyConnectionsRequest => proto::PROXY_CONNECTIONS_REQUEST,
            Message::BackendStatusResponse { .. } => proto::BACKEND_STATUS_RESPONSE,
            Message::BackendStatusRequest => proto::BACKEND_STATUS_REQUEST,
            Message::ProxyStatusRequest { .. } => proto::PROXY_STATUS_REQUEST,
            Message::ProxyStatusResponse { .. } => proto::PROXY_STATUS_RESPONSE,
            Message::ProxyInstanceResponse { .. } => proto::PROXY_INSTANCE_RESPONSE,
            Message::ProxyInstanceRequest => proto::PROXY_INSTANCE_REQUEST,
        }
    }

    /// Encodes this message to its wire representation.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut out = vec![self.tag()];

        match self {
            Message::Start { args } => push_length_prefixed(&mut out, args)?,
            Message::Stop | Message::ProxyConnectionsRequest | Message::BackendStatusRequest | Message::ProxyInstanceRequest => {}
            Message::AddProxy { source_ip, source_port, dest_port, protocol }
            | Message::RemoveProxy { source_ip, source_port, dest_port, protocol }
            | Message::CheckClientParameters { source_ip, source_port, dest_port, protocol }
            | Message::ProxyStatusRequest { source_ip, source_port, dest_port, protocol } => {
                push_four_tuple(&mut out, source_ip, *source_port, *dest_port, *protocol);
            }
            Message::ProxyConnectionsResponse { connections } => {
                out.extend_from_slice(&encode_sequence(connections, encode_connection));
            }
            Message::CheckServerParameters { args } => push_length_prefixed(&mut out, args)?,
            Message::CheckParametersResponse { in_response_to, is_valid, message } => {
                out.push(in_response_to.to_byte());
                out.push(u8::from(*is_valid));
                push_length_prefixed(&mut out, message.as_bytes())?;
            }
            Message::BackendStatusResponse { is_running, status_code, message } => {
                out.push(u8::from(*is_running));
                out.push(status_code.to_byte());
                push_length_prefixed(&mut out, message.as_bytes())?;
            }
            Message::ProxyStatusResponse { source_ip, source_port, dest_port, protocol, is_active } => {
                push_four_tuple(&mut out, source_ip, *source_port, *dest_port, *protocol);
                out.push(u8::from(*is_active));
            }
            Message::ProxyInstanceResponse { proxies } => {
                out.extend_from_slice(&encode_sequence(proxies, encode_proxy_instance));
            }
        }

        Ok(out)
    }

    /// Decodes one framed message from `reader`.
    pub fn decode(reader: &mut impl Read) -> Result<Message, WireError> {
        let tag = read_u8(reader)?;

        Ok(match tag {
            proto::START => Message::Start { args: read_length_prefixed(reader)? },
            proto::STOP => Message::Stop,
            proto::ADD_PROXY => {
                let (source_ip, source_port, dest_port, protocol) = read_four_tuple(reader)?;
                Message::AddProxy { source_ip, source_port, dest_port, protocol }
            }
            proto::REMOVE_PROXY => {
                let (source_ip, source_port, dest_port, protocol) = read_four_tuple(reader)?;
                Message::RemoveProxy { source_ip, source_port, dest_port, protocol }
            }
            proto::PROXY_CONNECTIONS_RESPONSE => {
                let (connections, err) = decode_proxy_connections(reader);
                if let Some(err) = err {
                    return Err(err);
                }
                Message::ProxyConnectionsResponse { connections }
            }
            proto::CHECK_CLIENT_PARAMETERS => {
                let (source_ip, source_port, dest_port, protocol) = read_four_tuple(reader)?;
                Message::CheckClientParameters { source_ip, source_port, dest_port, protocol }
            }
            proto::CHECK_SERVER_PARAMETERS => Message::CheckServerParameters { args: read_length_prefixed(reader)? },
            proto::CHECK_PARAMETERS_RESPONSE => {
                let in_response_to = ParamsTarget::from_byte(read_u8(reader)?)?;
                let is_valid = read_u8(reader)? == 1;
                let message = read_length_prefixed_string(reader)?;
                Message::CheckParametersResponse { in_response_to, is_valid, message }
            }
            proto::PROXY_CONNECTIONS_REQUEST => Message::ProxyConnectionsRequest,
            proto::BACKEND_STATUS_RESPONSE => {
                let is_running = read_u8(reader)? == 1;
                let status_code = StatusCode::from_byte(read_u8(reader)?);
                let message = read_length_prefixed_string(reader)?;
                Message::BackendStatusResponse { is_running, status_code, message }
            }
            proto::BACKEND_STATUS_REQUEST => Message::BackendStatusRequest,
            proto::PROXY_STATUS_REQUEST => {
                let (source_ip, source_port, dest_port, protocol) = read_four_tuple(reader)?;
                Message::ProxyStatusRequest { source_ip, source_port, dest_port, protocol }
            }
            proto::PROXY_STATUS_RESPONSE => {
                let (source_ip, source_port, dest_port, protocol) = read_four_tuple(reader)?;
                let is_active = read_u8(reader)? == 1;
                Message::ProxyStatusResponse { source_ip, source_port, dest_port, protocol, is_active }
            }
            proto::PROXY_INSTANCE_RESPONSE => {
                let (proxies, err) = decode_proxy_instances(reader);
                if let Some(err) = err {
                    return Err(err);
                }
                Message::ProxyInstanceResponse { proxies }
            }
            proto::PROXY_INSTANCE_REQUEST => Message::ProxyInstanceRequest,
            other => return Err(WireError::UnknownTag(other)),
        })
    }
}

/// Parses a protocol name (`"tcp"`/`"udp"`) the way callers assembling an
/// [`Message::AddProxy`]-family message from user input would.
pub fn parse_protocol(name: &str) -> Result<Protocol, WireError> {
    Protocol::parse_name(name)
}
