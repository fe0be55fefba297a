//! Entity visibility and movement broadcasts.
//!
//! Spawn uses a VarInt entity id; the per-tick movement packets keep the
//! older 32-bit id of protocol 5.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, to_angle, to_fixed_point, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;
use crate::types::VarInt;

/// SpawnPlayer (0x0C).
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPlayer {
    pub entity_id: i32,
    pub uuid: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub current_item: i16,
}

impl ProtoEncode for SpawnPlayer {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarInt(self.entity_id).proto_encode(buf);
        write_string(buf, &self.uuid);
        write_string(buf, &self.name);
        VarInt(0).proto_encode(buf); // no profile properties
        buf.put_i32(to_fixed_point(self.x));
        buf.put_i32(to_fixed_point(self.y));
        buf.put_i32(to_fixed_point(self.z));
        buf.put_u8(to_angle(self.yaw));
        buf.put_u8(to_angle(self.pitch));
        buf.put_i16(self.current_item);
        // Metadata: clients require at least one watched value; send health
        // (float at index 6), then the terminator.
        buf.put_u8((3 << 5) | 6);
        buf.put_f32(20.0);
        buf.put_u8(0x7F);
    }
}

/// DestroyEntities (0x13).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyEntities {
    pub entity_ids: Vec<i32>,
}

impl ProtoEncode for DestroyEntities {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.entity_ids.len() as u8);
        for id in &self.entity_ids {
            buf.put_i32(*id);
        }
    }
}

/// EntityRelativeMove (0x15): deltas in 1/32 block, each within ±4 blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRelMove {
    pub entity_id: i32,
    pub dx: i8,
    pub dy: i8,
    pub dz: i8,
}

impl ProtoEncode for EntityRelMove {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.entity_id);
        buf.put_i8(self.dx);
        buf.put_i8(self.dy);
        buf.put_i8(self.dz);
    }
}

/// EntityLook (0x16).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityLook {
    pub entity_id: i32,
    pub yaw: f32,
    pub pitch: f32,
}

impl ProtoEncode for EntityLook {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.entity_id);
        buf.put_u8(to_angle(self.yaw));
        buf.put_u8(to_angle(self.pitch));
    }
}

/// EntityLookAndRelativeMove (0x17).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityLookRelMove {
    pub entity_id: i32,
    pub dx: i8,
    pub dy: i8,
    pub dz: i8,
    pub yaw: f32,
    pub pitch: f32,
}

impl ProtoEncode for EntityLookRelMove {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.entity_id);
        buf.put_i8(self.dx);
        buf.put_i8(self.dy);
        buf.put_i8(self.dz);
        buf.put_u8(to_angle(self.yaw));
        buf.put_u8(to_angle(self.pitch));
    }
}

/// EntityTeleport (0x18): absolute fixed-point position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityTeleport {
    pub entity_id: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

impl ProtoEncode for EntityTeleport {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.entity_id);
        buf.put_i32(to_fixed_point(self.x));
        buf.put_i32(to_fixed_point(self.y));
        buf.put_i32(to_fixed_point(self.z));
        buf.put_u8(to_angle(self.yaw));
        buf.put_u8(to_angle(self.pitch));
    }
}

/// EntityHeadLook (0x19).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityHeadLook {
    pub entity_id: i32,
    pub head_yaw: f32,
}

impl ProtoEncode for EntityHeadLook {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.entity_id);
        buf.put_u8(to_angle(self.head_yaw));
    }
}

/// EntityStatus (0x1A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityStatus {
    pub entity_id: i32,
    pub status: i8,
}

impl ProtoEncode for EntityStatus {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.entity_id);
        buf.put_i8(self.status);
    }
}

/// Serverbound UseEntity (0x02).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseEntity {
    pub target_id: i32,
    /// 0 = interact, 1 = attack.
    pub mouse: i8,
}

impl ProtoDecode for UseEntity {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 5)?;
        Ok(Self {
            target_id: buf.get_i32(),
            mouse: buf.get_i8(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn spawn_player_ends_with_metadata_terminator() {
        let pkt = SpawnPlayer {
            entity_id: 7,
            uuid: "069a79f4-44e9-4726-a5be-fca90e38aaf5".into(),
            name: "Notch".into(),
            x: 0.5,
            y: 64.0,
            z: 0.5,
            yaw: 0.0,
            pitch: 0.0,
            current_item: 0,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf[buf.len() - 1], 0x7F);
    }

    #[test]
    fn fixed_point_position_in_teleport() {
        let pkt = EntityTeleport {
            entity_id: 1,
            x: 1.5,
            y: 64.0,
            z: -1.5,
            yaw: 0.0,
            pitch: 0.0,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let x = i32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let z = i32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);
        assert_eq!(x, 48);
        assert_eq!(z, -48);
    }

    #[test]
    fn destroy_entities_byte_count() {
        let pkt = DestroyEntities {
            entity_ids: vec![1, 2, 3],
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf.len(), 1 + 12);
        assert_eq!(buf[0], 3);
    }
}
