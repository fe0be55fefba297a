//! The join sequence packets and their later companions.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;

/// JoinGame (0x01).
#[derive(Debug, Clone, PartialEq)]
pub struct JoinGame {
    pub entity_id: i32,
    /// 0 = survival, 1 = creative, 2 = adventure; bit 3 = hardcore.
    pub gamemode: u8,
    /// -1 = nether, 0 = overworld, 1 = end.
    pub dimension: i8,
    pub difficulty: u8,
    pub max_players: u8,
    /// "default", "flat", "largeBiomes", "amplified".
    pub level_type: String,
}

impl ProtoEncode for JoinGame {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.entity_id);
        buf.put_u8(self.gamemode);
        buf.put_i8(self.dimension);
        buf.put_u8(self.difficulty);
        buf.put_u8(self.max_players);
        write_string(buf, &self.level_type);
    }
}

impl ProtoDecode for JoinGame {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 8)?;
        Ok(Self {
            entity_id: buf.get_i32(),
            gamemode: buf.get_u8(),
            dimension: buf.get_i8(),
            difficulty: buf.get_u8(),
            max_players: buf.get_u8(),
            level_type: read_string(buf, 16)?,
        })
    }
}

/// SpawnPosition (0x05): block coordinates of the world spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ProtoEncode for SpawnPosition {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.x);
        buf.put_i32(self.y);
        buf.put_i32(self.z);
    }
}

impl ProtoDecode for SpawnPosition {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 12)?;
        Ok(Self {
            x: buf.get_i32(),
            y: buf.get_i32(),
            z: buf.get_i32(),
        })
    }
}

/// PlayerPositionAndLook (0x08, clientbound).
///
/// The y on the wire is the eye position; clients subtract the 1.62 eye
/// height to get feet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPosAndLook {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}

impl ProtoEncode for PlayerPosAndLook {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_f64(self.x);
        buf.put_f64(self.y);
        buf.put_f64(self.z);
        buf.put_f32(self.yaw);
        buf.put_f32(self.pitch);
        buf.put_u8(self.on_ground as u8);
    }
}

impl ProtoDecode for PlayerPosAndLook {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 33)?;
        Ok(Self {
            x: buf.get_f64(),
            y: buf.get_f64(),
            z: buf.get_f64(),
            yaw: buf.get_f32(),
            pitch: buf.get_f32(),
            on_ground: buf.get_u8() != 0,
        })
    }
}

/// PlayerAbilities: clientbound 0x39 and serverbound 0x13 share the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerAbilities {
    /// Bit 0 invulnerable, 1 flying, 2 allow-flying, 3 creative.
    pub flags: u8,
    pub fly_speed: f32,
    pub walk_speed: f32,
}

impl PlayerAbilities {
    pub const INVULNERABLE: u8 = 0x01;
    pub const FLYING: u8 = 0x02;
    pub const ALLOW_FLYING: u8 = 0x04;
    pub const CREATIVE: u8 = 0x08;

    pub fn is_flying(&self) -> bool {
        self.flags & Self::FLYING != 0
    }

    pub fn allows_flying(&self) -> bool {
        self.flags & Self::ALLOW_FLYING != 0
    }
}

impl ProtoEncode for PlayerAbilities {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.flags);
        buf.put_f32(self.fly_speed);
        buf.put_f32(self.walk_speed);
    }
}

impl ProtoDecode for PlayerAbilities {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 9)?;
        Ok(Self {
            flags: buf.get_u8(),
            fly_speed: buf.get_f32(),
            walk_speed: buf.get_f32(),
        })
    }
}

/// HeldItemChange (0x09, clientbound): hotbar slot as a signed byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldItemChangeCb {
    pub slot: i8,
}

impl ProtoEncode for HeldItemChangeCb {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i8(self.slot);
    }
}

/// Respawn (0x07).
#[derive(Debug, Clone, PartialEq)]
pub struct Respawn {
    pub dimension: i32,
    pub difficulty: u8,
    pub gamemode: u8,
    pub level_type: String,
}

impl ProtoEncode for Respawn {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.dimension);
        buf.put_u8(self.difficulty);
        buf.put_u8(self.gamemode);
        write_string(buf, &self.level_type);
    }
}

impl ProtoDecode for Respawn {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 6)?;
        Ok(Self {
            dimension: buf.get_i32(),
            difficulty: buf.get_u8(),
            gamemode: buf.get_u8(),
            level_type: read_string(buf, 16)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn join_game_layout() {
        let pkt = JoinGame {
            entity_id: 1,
            gamemode: 0,
            dimension: 0,
            difficulty: 1,
            max_players: 20,
            level_type: "flat".into(),
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        // i32 + 4 single bytes + VarInt(4) + "flat"
        assert_eq!(buf.len(), 4 + 4 + 1 + 4);
        assert_eq!(&buf[..4], &[0, 0, 0, 1]);
        let decoded = JoinGame::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn pos_and_look_roundtrip() {
        let pkt = PlayerPosAndLook {
            x: 0.5,
            y: 65.62,
            z: -7.5,
            yaw: 90.0,
            pitch: -12.5,
            on_ground: true,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf.len(), 33);
        assert_eq!(PlayerPosAndLook::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn abilities_flags() {
        let pkt = PlayerAbilities {
            flags: PlayerAbilities::FLYING | PlayerAbilities::ALLOW_FLYING,
            fly_speed: 0.05,
            walk_speed: 0.1,
        };
        assert!(pkt.is_flying());
        assert!(pkt.allows_flying());
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(PlayerAbilities::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
