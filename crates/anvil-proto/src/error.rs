//! Protocol error types.

use thiserror::Error;

/// Errors raised while reading or validating wire data. Any of these closes
/// the offending connection; a login-phase error sends a disconnect packet
/// with a readable reason first.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("VarInt is too long (more than {max_bytes} bytes)")]
    VarIntTooLong { max_bytes: usize },

    #[error("buffer too short: needed {needed}, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("frame of {len} bytes exceeds the 2 MiB limit")]
    FrameTooLarge { len: usize },

    #[error("string of {len} bytes exceeds cap of {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("unknown packet id {id:#04x} in {phase} phase")]
    UnknownPacketId { phase: &'static str, id: i32 },

    #[error("unsupported protocol version {0}")]
    UnsupportedProtocol(i32),

    #[error("keep-alive timeout")]
    KeepAliveTimeout,

    #[error("malformed packet: {0}")]
    Malformed(String),

    #[error("zlib error: {0}")]
    Zlib(String),
}

impl ProtocolError {
    /// Shorthand for [`ProtocolError::Malformed`].
    pub fn malformed(msg: impl Into<String>) -> Self {
        ProtocolError::Malformed(msg.into())
    }
}
