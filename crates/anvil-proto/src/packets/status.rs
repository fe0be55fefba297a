//! Status phase: request/response and ping/pong.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;

pub const REQUEST: i32 = 0x00;
pub const RESPONSE: i32 = 0x00;
pub const PING: i32 = 0x01;
pub const PONG: i32 = 0x01;

/// Serverbound request. Empty body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRequest;

impl ProtoDecode for StatusRequest {
    fn proto_decode(_buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        Ok(StatusRequest)
    }
}

/// Clientbound response carrying the status JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResponsePacket {
    pub json: String,
}

impl ProtoEncode for StatusResponsePacket {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.json);
    }
}

impl ProtoDecode for StatusResponsePacket {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        Ok(Self {
            json: read_string(buf, 32767)?,
        })
    }
}

/// Ping/pong: the 8-byte client timestamp is echoed verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    pub payload: i64,
}

impl ProtoEncode for Ping {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i64(self.payload);
    }
}

impl ProtoDecode for Ping {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 8)?;
        Ok(Self {
            payload: buf.get_i64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn ping_echo_bytes() {
        let ping = Ping {
            payload: 0x0123_4567_89AB_CDEF,
        };
        let mut buf = BytesMut::new();
        ping.proto_encode(&mut buf);
        assert_eq!(
            &buf[..],
            &[0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF]
        );
        let decoded = Ping::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, ping);
    }

    #[test]
    fn ping_too_short() {
        let data = bytes::Bytes::from_static(&[0x00, 0x01]);
        assert!(Ping::proto_decode(&mut data.clone()).is_err());
    }

    #[test]
    fn response_roundtrip() {
        let pkt = StatusResponsePacket {
            json: r#"{"description":{"text":"hi"}}"#.into(),
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let decoded = StatusResponsePacket::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, pkt);
    }
}
