//! Chunk transfer packets (0x21 ChunkData, 0x26 MapChunkBulk).
//!
//! Both carry zlib-compressed section arrays produced elsewhere; the packet
//! layer only frames the masks and the compressed bytes.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::compression::deflate_zlib;
use crate::error::ProtocolError;

/// ChunkData (0x21).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkData {
    pub chunk_x: i32,
    pub chunk_z: i32,
    /// A "ground-up continuous" column, carrying biome bytes at the tail.
    pub full_chunk: bool,
    /// Bit i set = section i present in the data.
    pub primary_bitmask: u16,
    /// Bit i set = section i carries the high-nibble block-id array.
    pub add_bitmask: u16,
    pub compressed: Vec<u8>,
}

impl ChunkData {
    /// The unload form: a full chunk with no sections, whose payload is the
    /// compressed 256 zero biome bytes.
    pub fn unload(chunk_x: i32, chunk_z: i32) -> Self {
        Self {
            chunk_x,
            chunk_z,
            full_chunk: true,
            primary_bitmask: 0,
            add_bitmask: 0,
            compressed: deflate_zlib(&[0u8; 256]),
        }
    }
}

impl ProtoEncode for ChunkData {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.chunk_x);
        buf.put_i32(self.chunk_z);
        buf.put_u8(self.full_chunk as u8);
        buf.put_u16(self.primary_bitmask);
        buf.put_u16(self.add_bitmask);
        buf.put_i32(self.compressed.len() as i32);
        buf.put_slice(&self.compressed);
    }
}

impl ProtoDecode for ChunkData {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 17)?;
        let chunk_x = buf.get_i32();
        let chunk_z = buf.get_i32();
        let full_chunk = buf.get_u8() != 0;
        let primary_bitmask = buf.get_u16();
        let add_bitmask = buf.get_u16();
        let len = buf.get_i32();
        if len < 0 {
            return Err(ProtocolError::malformed("negative chunk data length"));
        }
        let len = len as usize;
        ensure(buf, len)?;
        Ok(Self {
            chunk_x,
            chunk_z,
            full_chunk,
            primary_bitmask,
            add_bitmask,
            compressed: buf.copy_to_bytes(len).to_vec(),
        })
    }
}

/// Per-column metadata at the tail of a MapChunkBulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkChunkMeta {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub primary_bitmask: u16,
    pub add_bitmask: u16,
}

/// MapChunkBulk (0x26): several full columns sharing one zlib stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapChunkBulk {
    pub sky_light: bool,
    pub compressed: Vec<u8>,
    pub metas: Vec<BulkChunkMeta>,
}

impl ProtoEncode for MapChunkBulk {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.metas.len() as i16);
        buf.put_i32(self.compressed.len() as i32);
        buf.put_u8(self.sky_light as u8);
        buf.put_slice(&self.compressed);
        for meta in &self.metas {
            buf.put_i32(meta.chunk_x);
            buf.put_i32(meta.chunk_z);
            buf.put_u16(meta.primary_bitmask);
            buf.put_u16(meta.add_bitmask);
        }
    }
}
