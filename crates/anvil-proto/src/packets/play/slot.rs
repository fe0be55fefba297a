//! Slot data: the inline item stack encoding used by inventory packets.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;

/// Largest NBT blob accepted inside a slot.
const MAX_SLOT_NBT: i16 = i16::MAX;

/// An item stack on the wire: `i16 id` (-1 = empty), then count, damage, and
/// an optional gzipped NBT blob prefixed by an `i16` length (-1 = none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: i16,
    pub count: u8,
    pub damage: i16,
    /// Raw compressed NBT, kept opaque.
    pub nbt: Vec<u8>,
}

impl Slot {
    pub const EMPTY: Slot = Slot {
        id: -1,
        count: 0,
        damage: 0,
        nbt: Vec::new(),
    };

    pub fn new(id: i16, count: u8, damage: i16) -> Self {
        Self {
            id,
            count,
            damage,
            nbt: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id < 0 || self.count == 0
    }
}

impl ProtoEncode for Slot {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        if self.id < 0 {
            buf.put_i16(-1);
            return;
        }
        buf.put_i16(self.id);
        buf.put_u8(self.count);
        buf.put_i16(self.damage);
        if self.nbt.is_empty() {
            buf.put_i16(-1);
        } else {
            buf.put_i16(self.nbt.len() as i16);
            buf.put_slice(&self.nbt);
        }
    }
}

impl ProtoDecode for Slot {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 2)?;
        let id = buf.get_i16();
        if id < 0 {
            return Ok(Slot::EMPTY);
        }
        ensure(buf, 5)?;
        let count = buf.get_u8();
        let damage = buf.get_i16();
        let nbt_len = buf.get_i16();
        let nbt = if nbt_len < 0 {
            Vec::new()
        } else {
            if nbt_len > MAX_SLOT_NBT {
                return Err(ProtocolError::malformed("slot NBT too large"));
            }
            let len = nbt_len as usize;
            ensure(buf, len)?;
            buf.copy_to_bytes(len).to_vec()
        };
        Ok(Slot {
            id,
            count,
            damage,
            nbt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn empty_is_two_bytes() {
        let mut buf = BytesMut::new();
        Slot::EMPTY.proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0xFF, 0xFF]);
        let decoded = Slot::proto_decode(&mut buf.freeze()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn plain_item_roundtrip() {
        let slot = Slot::new(1, 64, 0);
        let mut buf = BytesMut::new();
        slot.proto_encode(&mut buf);
        // id + count + damage + nbt marker
        assert_eq!(buf.len(), 2 + 1 + 2 + 2);
        assert_eq!(Slot::proto_decode(&mut buf.freeze()).unwrap(), slot);
    }

    #[test]
    fn item_with_nbt_roundtrip() {
        let slot = Slot {
            id: 276,
            count: 1,
            damage: 3,
            nbt: vec![0x1F, 0x8B, 0x08, 0x00],
        };
        let mut buf = BytesMut::new();
        slot.proto_encode(&mut buf);
        assert_eq!(Slot::proto_decode(&mut buf.freeze()).unwrap(), slot);
    }

    #[test]
    fn truncated_nbt_is_an_error() {
        let mut buf = BytesMut::new();
        buf.put_i16(1);
        buf.put_u8(1);
        buf.put_i16(0);
        buf.put_i16(10); // claims ten NBT bytes, provides none
        assert!(Slot::proto_decode(&mut buf.freeze()).is_err());
    }
}
