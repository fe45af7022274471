#![forbid(unsafe_code)]
//! Tagged binary wire codec for the Hermes backend control protocol.
//!
//! This crate has no I/O state of its own: [`Message::encode`] produces a
//! `Vec<u8>` and [`Message::decode`] consumes anything implementing
//! [`std::io::Read`]. Both sides of the control connection (the supervisor
//! and the child's protocol loop) depend on this crate and nothing else to
//! agree on framing.

mod error;
mod io;
mod message;
mod proto;

pub use error::WireError;
pub use message::{
    ClientConnection, Message, ProxyInstance, decode_proxy_connections, decode_proxy_instances,
    parse_protocol,
};
pub use proto::{ParamsTarget, Protocol, StatusCode};

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn roundtrip(msg: &Message) {
        let bytes = msg.encode().expect("encode");
        let mut cursor = std::io::Cursor::new(bytes);
        let decoded = Message::decode(&mut cursor).expect("decode");
        assert_eq!(&decoded, msg);
    }

    #[test]
    fn start_roundtrips() {
        roundtrip(&Message::Start { args: b"Hello from automated testing".to_vec() });
    }

    #[test]
    fn add_proxy_roundtrips() {
        roundtrip(&Message::AddProxy {
            source_ip: "192.168.0.139".parse().unwrap(),
            source_port: 19132,
            dest_port: 19132,
            protocol: Protocol::Tcp,
        });
    }

    #[test]
    fn proxy_connections_response_roundtrips() {
        let connections = vec![
            ClientConnection {
                source_ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
                source_port: 19132,
                dest_port: 19132,
                client_ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
                client_port: 12321,
            },
            ClientConnection {
                source_ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
                source_port: 19132,
                dest_port: 19132,
                client_ip: IpAddr::V4(Ipv4Addr::new(192, 168, 0, 168)),
                client_port: 23457,
            },
            ClientConnection {
                source_ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
                source_port: 19132,
                dest_port: 19132,
                client_ip: IpAddr::V4(Ipv4Addr::new(68, 42, 203, 47)),
                client_port: 38721,
            },
        ];
        roundtrip(&Message::ProxyConnectionsResponse { connections });
    }

    #[test]
    fn empty_proxy_connections_response_roundtrips() {
        roundtrip(&Message::ProxyConnectionsResponse { connections: vec![] });
    }

    #[test]
    fn check_parameters_response_roundtrips() {
        roundtrip(&Message::CheckParametersResponse {
            in_response_to: ParamsTarget::Client,
            is_valid: true,
            message: "Hello from automated testing".to_string(),
        });
    }

    #[test]
    fn backend_status_response_roundtrips() {
        roundtrip(&Message::BackendStatusResponse {
            is_running: true,
            status_code: StatusCode::Failure,
            message: "Hello from automated testing".to_string(),
        });
    }

    #[test]
    fn proxy_instance_response_roundtrips() {
        let proxies = vec![
            ProxyInstance {
                source_ip: "10.0.0.1".parse().unwrap(),
                source_port: 1234,
                dest_port: 4321,
                protocol: Protocol::Tcp,
            },
            ProxyInstance {
                source_ip: "10.0.0.2".parse().unwrap(),
                source_port: 5555,
                dest_port: 6666,
                protocol: Protocol::Udp,
            },
            ProxyInstance {
                source_ip: "::1".parse().unwrap(),
                source_port: 7777,
                dest_port: 8888,
                protocol: Protocol::Tcp,
            },
        ];
        roundtrip(&Message::ProxyInstanceResponse { proxies });
    }

    #[test]
    fn empty_proxy_instance_response_roundtrips() {
        roundtrip(&Message::ProxyInstanceResponse { proxies: vec![] });
    }

    #[test]
    fn stop_and_request_variants_roundtrip() {
        roundtrip(&Message::Stop);
        roundtrip(&Message::BackendStatusRequest);
        roundtrip(&Message::ProxyConnectionsRequest);
        roundtrip(&Message::ProxyInstanceRequest);
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let bytes = vec![250u8];
        let mut cursor = std::io::Cursor::new(bytes);
        assert!(matches!(Message::decode(&mut cursor), Err(WireError::UnknownTag(250))));
    }

    #[test]
    fn truncated_buffer_never_panics() {
        let full = Message::AddProxy {
            source_ip: "192.168.0.139".parse().unwrap(),
            source_port: 19132,
            dest_port: 19132,
            protocol: Protocol::Tcp,
        }
        .encode()
        .unwrap();

        for prefix_len in 0..full.len() {
            let mut cursor = std::io::Cursor::new(&full[..prefix_len]);
            assert!(Message::decode(&mut cursor).is_err());
        }
    }

    #[test]
    fn bad_delimiter_returns_partial_elements_and_error() {
        // One well-formed connection followed by a garbage delimiter byte
        // instead of '\r' or '\n'.
        let conn = ClientConnection {
            source_ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            source_port: 1,
            dest_port: 2,
            client_ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            client_port: 3,
        };
        let mut body = message::encode_connection(&conn);
        body.push(b'!');

        let mut cursor = std::io::Cursor::new(body);
        let (parsed, err) = decode_proxy_connections(&mut cursor);
        assert_eq!(parsed, vec![conn]);
        assert!(matches!(err, Some(WireError::BadDelimiter(1))));
    }

    #[test]
    fn check_client_protocol_byte_is_read_from_index_zero() {
        // Regression test for the historical protocolBytes[1] decoder bug:
        // a single-byte protocol field at offset 0 must decode correctly.
        roundtrip(&Message::CheckClientParameters {
            source_ip: "127.0.0.1".parse().unwrap(),
            source_port: 1,
            dest_port: 2,
            protocol: Protocol::Udp,
        });
        roundtrip(&Message::RemoveProxy {
            source_ip: "127.0.0.1".parse().unwrap(),
            source_port: 1,
            dest_port: 2,
            protocol: Protocol::Udp,
        });
        roundtrip(&Message::ProxyStatusRequest {
            source_ip: "127.0.0.1".parse().unwrap(),
            source_port: 1,
            dest_port: 2,
            protocol: Protocol::Udp,
        });
    }
}
