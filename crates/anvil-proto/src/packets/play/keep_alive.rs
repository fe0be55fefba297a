//! KeepAlive (0x00): both directions carry the same VarInt id.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;
use crate::types::VarInt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    pub id: i32,
}

impl ProtoEncode for KeepAlive {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarInt(self.id).proto_encode(buf);
    }
}

impl ProtoDecode for KeepAlive {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        Ok(Self {
            id: VarInt::proto_decode(buf)?.0,
        })
    }
}
