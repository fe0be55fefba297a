//! Serverbound movement packets (0x03-0x06).
//!
//! 0x04 and 0x06 carry a legacy `head_y` double between feet-y and z; it is
//! parsed to keep the cursor aligned and then discarded by the session.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;

/// Player (0x03): only the on-ground flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerGround {
    pub on_ground: bool,
}

impl ProtoEncode for PlayerGround {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.on_ground as u8);
    }
}

impl ProtoDecode for PlayerGround {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 1)?;
        Ok(Self {
            on_ground: buf.get_u8() != 0,
        })
    }
}

/// PlayerPosition (0x04).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPosition {
    pub x: f64,
    pub feet_y: f64,
    pub head_y: f64,
    pub z: f64,
    pub on_ground: bool,
}

impl ProtoEncode for PlayerPosition {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_f64(self.x);
        buf.put_f64(self.feet_y);
        buf.put_f64(self.head_y);
        buf.put_f64(self.z);
        buf.put_u8(self.on_ground as u8);
    }
}

impl ProtoDecode for PlayerPosition {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 33)?;
        Ok(Self {
            x: buf.get_f64(),
            feet_y: buf.get_f64(),
            head_y: buf.get_f64(),
            z: buf.get_f64(),
            on_ground: buf.get_u8() != 0,
        })
    }
}

/// PlayerLook (0x05).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerLook {
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}

impl ProtoEncode for PlayerLook {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_f32(self.yaw);
        buf.put_f32(self.pitch);
        buf.put_u8(self.on_ground as u8);
    }
}

impl ProtoDecode for PlayerLook {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 9)?;
        Ok(Self {
            yaw: buf.get_f32(),
            pitch: buf.get_f32(),
            on_ground: buf.get_u8() != 0,
        })
    }
}

/// PlayerPositionAndLook (0x06, serverbound).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPosAndLookSb {
    pub x: f64,
    pub feet_y: f64,
    pub head_y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}

impl ProtoEncode for PlayerPosAndLookSb {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_f64(self.x);
        buf.put_f64(self.feet_y);
        buf.put_f64(self.head_y);
        buf.put_f64(self.z);
        buf.put_f32(self.yaw);
        buf.put_f32(self.pitch);
        buf.put_u8(self.on_ground as u8);
    }
}

impl ProtoDecode for PlayerPosAndLookSb {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 41)?;
        Ok(Self {
            x: buf.get_f64(),
            feet_y: buf.get_f64(),
            head_y: buf.get_f64(),
            z: buf.get_f64(),
            yaw: buf.get_f32(),
            pitch: buf.get_f32(),
            on_ground: buf.get_u8() != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn position_roundtrip() {
        let pkt = PlayerPosition {
            x: 100.25,
            feet_y: 64.0,
            head_y: 65.62,
            z: -3.5,
            on_ground: true,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf.len(), 33);
        assert_eq!(PlayerPosition::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn pos_and_look_roundtrip() {
        let pkt = PlayerPosAndLookSb {
            x: 0.5,
            feet_y: 4.0,
            head_y: 5.62,
            z: 0.5,
            yaw: 180.0,
            pitch: 45.0,
            on_ground: false,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf.len(), 41);
        assert_eq!(
            PlayerPosAndLookSb::proto_decode(&mut buf.freeze()).unwrap(),
            pkt
        );
    }

    #[test]
    fn truncated_position() {
        let data = bytes::Bytes::from_static(&[0u8; 10]);
        assert!(PlayerPosition::proto_decode(&mut data.clone()).is_err());
    }
}
