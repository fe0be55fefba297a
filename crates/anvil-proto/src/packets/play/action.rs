//! Serverbound interaction packets: digging, placement, hotbar, actions.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;
use crate::packets::play::slot::Slot;

/// Digging statuses of PlayerDigging.
pub mod dig_status {
    pub const START: i8 = 0;
    pub const CANCEL: i8 = 1;
    pub const FINISH: i8 = 2;
    pub const DROP_STACK: i8 = 3;
    pub const DROP_ITEM: i8 = 4;
    pub const RELEASE_USE_ITEM: i8 = 5;
}

/// PlayerDigging (0x07).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDigging {
    pub status: i8,
    pub x: i32,
    pub y: u8,
    pub z: i32,
    pub face: i8,
}

impl ProtoEncode for PlayerDigging {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i8(self.status);
        buf.put_i32(self.x);
        buf.put_u8(self.y);
        buf.put_i32(self.z);
        buf.put_i8(self.face);
    }
}

impl ProtoDecode for PlayerDigging {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 11)?;
        Ok(Self {
            status: buf.get_i8(),
            x: buf.get_i32(),
            y: buf.get_u8(),
            z: buf.get_i32(),
            face: buf.get_i8(),
        })
    }
}

/// BlockPlace (0x08). `direction == -1` with all-coordinate -1 means
/// "use held item in the air".
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPlace {
    pub x: i32,
    pub y: u8,
    pub z: i32,
    pub direction: i8,
    pub held: Slot,
    pub cursor_x: i8,
    pub cursor_y: i8,
    pub cursor_z: i8,
}

impl ProtoEncode for BlockPlace {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.x);
        buf.put_u8(self.y);
        buf.put_i32(self.z);
        buf.put_i8(self.direction);
        self.held.proto_encode(buf);
        buf.put_i8(self.cursor_x);
        buf.put_i8(self.cursor_y);
        buf.put_i8(self.cursor_z);
    }
}

impl ProtoDecode for BlockPlace {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 10)?;
        let x = buf.get_i32();
        let y = buf.get_u8();
        let z = buf.get_i32();
        let direction = buf.get_i8();
        let held = Slot::proto_decode(buf)?;
        ensure(buf, 3)?;
        Ok(Self {
            x,
            y,
            z,
            direction,
            held,
            cursor_x: buf.get_i8(),
            cursor_y: buf.get_i8(),
            cursor_z: buf.get_i8(),
        })
    }
}

/// HeldItemChange (0x09, serverbound): hotbar index 0-8 as a short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldItemChangeSb {
    pub slot: i16,
}

impl ProtoEncode for HeldItemChangeSb {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.slot);
    }
}

impl ProtoDecode for HeldItemChangeSb {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 2)?;
        Ok(Self {
            slot: buf.get_i16(),
        })
    }
}

/// EntityAction (0x0B): sneak/sprint/bed state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityAction {
    pub entity_id: i32,
    /// 1 sneak, 2 unsneak, 3 leave bed, 4 sprint, 5 unsprint.
    pub action: i8,
    pub jump_boost: i32,
}

impl ProtoDecode for EntityAction {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 9)?;
        Ok(Self {
            entity_id: buf.get_i32(),
            action: buf.get_i8(),
            jump_boost: buf.get_i32(),
        })
    }
}

/// Animation (0x0A, serverbound): arm swings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animation {
    pub entity_id: i32,
    pub animation: i8,
}

impl ProtoDecode for Animation {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 5)?;
        Ok(Self {
            entity_id: buf.get_i32(),
            animation: buf.get_i8(),
        })
    }
}

/// ClientStatus (0x16): 0 respawn, 1 stats request, 2 inventory achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientStatus {
    pub action: i8,
}

impl ProtoDecode for ClientStatus {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 1)?;
        Ok(Self {
            action: buf.get_i8(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn digging_roundtrip() {
        let pkt = PlayerDigging {
            status: dig_status::FINISH,
            x: 5,
            y: 70,
            z: 3,
            face: 1,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf.len(), 11);
        assert_eq!(PlayerDigging::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn block_place_with_empty_hand() {
        let pkt = BlockPlace {
            x: -1,
            y: 255,
            z: -1,
            direction: -1,
            held: Slot::EMPTY,
            cursor_x: 0,
            cursor_y: 0,
            cursor_z: 0,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(BlockPlace::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn block_place_with_item() {
        let pkt = BlockPlace {
            x: 10,
            y: 64,
            z: 20,
            direction: 1,
            held: Slot::new(1, 32, 0),
            cursor_x: 8,
            cursor_y: 16,
            cursor_z: 8,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(BlockPlace::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn entity_action_roundtrip() {
        let mut buf = BytesMut::new();
        buf.put_i32(9);
        buf.put_i8(4);
        buf.put_i32(0);
        let pkt = EntityAction::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(pkt.entity_id, 9);
        assert_eq!(pkt.action, 4);
    }
}
