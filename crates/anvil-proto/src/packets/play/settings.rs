//! Client-reported settings and other low-traffic serverbound packets.

use bytes::Buf;

use crate::codec::{ensure, read_string, ProtoDecode};
use crate::error::ProtocolError;

/// ClientSettings (0x15).
///
/// 1.7 clients also send a difficulty byte here; it is read and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub locale: String,
    pub view_distance: i8,
    pub chat_flags: i8,
    pub chat_colors: bool,
    pub skin_parts: u8,
}

impl ProtoDecode for ClientSettings {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        let locale = read_string(buf, 16)?;
        ensure(buf, 5)?;
        let view_distance = buf.get_i8();
        let chat_flags = buf.get_i8();
        let chat_colors = buf.get_u8() != 0;
        let _difficulty = buf.get_i8();
        let skin_parts = buf.get_u8();
        Ok(Self {
            locale,
            view_distance,
            chat_flags,
            chat_colors,
            skin_parts,
        })
    }
}

/// TabComplete (0x14).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabComplete {
    pub text: String,
}

impl ProtoDecode for TabComplete {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        Ok(Self {
            text: read_string(buf, 32767)?,
        })
    }
}

/// UpdateSign (0x12).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSign {
    pub x: i32,
    pub y: i16,
    pub z: i32,
    pub lines: [String; 4],
}

impl ProtoDecode for UpdateSign {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 10)?;
        let x = buf.get_i32();
        let y = buf.get_i16();
        let z = buf.get_i32();
        let lines = [
            read_string(buf, 15)?,
            read_string(buf, 15)?,
            read_string(buf, 15)?,
            read_string(buf, 15)?,
        ];
        Ok(Self { x, y, z, lines })
    }
}

/// SteerVehicle (0x0C).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteerVehicle {
    pub sideways: f32,
    pub forward: f32,
    pub jump: bool,
    pub unmount: bool,
}

impl ProtoDecode for SteerVehicle {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 10)?;
        Ok(Self {
            sideways: buf.get_f32(),
            forward: buf.get_f32(),
            jump: buf.get_u8() != 0,
            unmount: buf.get_u8() != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::write_string;
    use bytes::{BufMut, BytesMut};

    #[test]
    fn client_settings_skips_difficulty() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "en_US");
        buf.put_i8(8); // view distance
        buf.put_i8(0); // chat flags
        buf.put_u8(1); // chat colors
        buf.put_i8(2); // difficulty, unused
        buf.put_u8(0x7F); // skin parts
        let pkt = ClientSettings::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(pkt.locale, "en_US");
        assert_eq!(pkt.view_distance, 8);
        assert!(pkt.chat_colors);
        assert_eq!(pkt.skin_parts, 0x7F);
    }

    #[test]
    fn update_sign_lines() {
        let mut buf = BytesMut::new();
        buf.put_i32(1);
        buf.put_i16(64);
        buf.put_i32(2);
        for line in ["a", "b", "c", "d"] {
            write_string(&mut buf, line);
        }
        let pkt = UpdateSign::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(pkt.lines[2], "c");
    }
}
