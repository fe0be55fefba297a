//! World-state broadcasts: time, block changes, game state.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;
use crate::types::VarInt;

/// TimeUpdate (0x03).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUpdate {
    pub world_age: i64,
    pub time_of_day: i64,
}

impl ProtoEncode for TimeUpdate {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i64(self.world_age);
        buf.put_i64(self.time_of_day);
    }
}

impl ProtoDecode for TimeUpdate {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 16)?;
        Ok(Self {
            world_age: buf.get_i64(),
            time_of_day: buf.get_i64(),
        })
    }
}

/// BlockChange (0x23).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockChange {
    pub x: i32,
    pub y: u8,
    pub z: i32,
    pub block_id: i32,
    pub metadata: u8,
}

impl ProtoEncode for BlockChange {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.x);
        buf.put_u8(self.y);
        buf.put_i32(self.z);
        VarInt(self.block_id).proto_encode(buf);
        buf.put_u8(self.metadata);
    }
}

impl ProtoDecode for BlockChange {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 9)?;
        let x = buf.get_i32();
        let y = buf.get_u8();
        let z = buf.get_i32();
        let block_id = VarInt::proto_decode(buf)?.0;
        ensure(buf, 1)?;
        let metadata = buf.get_u8();
        Ok(Self {
            x,
            y,
            z,
            block_id,
            metadata,
        })
    }
}

/// One record inside a MultiBlockChange, with chunk-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockChangeRecord {
    pub local_x: u8,
    pub y: u8,
    pub local_z: u8,
    pub block_id: u16,
    pub metadata: u8,
}

/// MultiBlockChange (0x22).
///
/// Each record packs into 32 bits: x(4) z(4) y(8) id(12) meta(4), most
/// significant first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiBlockChange {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub records: Vec<BlockChangeRecord>,
}

impl ProtoEncode for MultiBlockChange {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.chunk_x);
        buf.put_i32(self.chunk_z);
        buf.put_i16(self.records.len() as i16);
        buf.put_i32(self.records.len() as i32 * 4);
        for r in &self.records {
            let packed: u32 = ((r.local_x as u32 & 0xF) << 28)
                | ((r.local_z as u32 & 0xF) << 24)
                | ((r.y as u32) << 16)
                | ((r.block_id as u32 & 0xFFF) << 4)
                | (r.metadata as u32 & 0xF);
            buf.put_u32(packed);
        }
    }
}

/// ChangeGameState (0x2B). Reasons: 1 = rain start, 2 = rain end,
/// 3 = gamemode change, …
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeGameState {
    pub reason: u8,
    pub value: f32,
}

impl ProtoEncode for ChangeGameState {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.reason);
        buf.put_f32(self.value);
    }
}
