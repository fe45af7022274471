use thiserror::Error;

/// Everything that can go wrong encoding or decoding a [`crate::Message`].
#[derive(Debug, Error)]
pub enum WireError {
    #[error("unexpected end of stream")]
    UnexpectedEof(#[from] std::io::Error),

    #[error("unknown message tag: {0}")]
    UnknownTag(u8),

    #[error("unknown protocol byte: {0}")]
    UnknownProtocol(u8),

    #[error("unknown IP version byte: {0}")]
    UnknownIpVersion(u8),

    #[error("unknown inResponseTo tag: {0}")]
    UnknownInResponseTo(u8),

    #[error("bad delimiter while decoding a sequence, after {0} element(s)")]
    BadDelimiter(usize),

    #[error("field exceeds the 65535-byte length prefix")]
    FieldTooLong,

    #[error("invalid protocol name: {0:?}")]
    InvalidProtocolName(String),
}
