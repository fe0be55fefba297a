//! Handshake phase (serverbound only).

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;
use crate::types::VarInt;

pub const HANDSHAKE: i32 = 0x00;

/// The first packet of every connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Handshake {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    /// 1 = status, 2 = login.
    pub next_state: i32,
}

impl ProtoEncode for Handshake {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarInt(self.protocol_version).proto_encode(buf);
        write_string(buf, &self.server_address);
        buf.put_u16(self.server_port);
        VarInt(self.next_state).proto_encode(buf);
    }
}

impl ProtoDecode for Handshake {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        let protocol_version = VarInt::proto_decode(buf)?.0;
        let server_address = read_string(buf, 255)?;
        ensure(buf, 2)?;
        let server_port = buf.get_u16();
        let next_state = VarInt::proto_decode(buf)?.0;
        Ok(Self {
            protocol_version,
            server_address,
            server_port,
            next_state,
        })
    }
}
