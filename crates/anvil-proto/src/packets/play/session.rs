//! Session-facing clientbound packets: health, experience, tab list,
//! plugin channels, kicks.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;
use crate::types::VarInt;

/// UpdateHealth (0x06).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateHealth {
    pub health: f32,
    pub food: i32,
    pub saturation: f32,
}

impl ProtoEncode for UpdateHealth {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_f32(self.health);
        VarInt(self.food).proto_encode(buf);
        buf.put_f32(self.saturation);
    }
}

/// SetExperience (0x1F).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetExperience {
    pub bar: f32,
    pub level: i32,
    pub total: i32,
}

impl ProtoEncode for SetExperience {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_f32(self.bar);
        VarInt(self.level).proto_encode(buf);
        VarInt(self.total).proto_encode(buf);
    }
}

/// PlayerListItem (0x38): the 1.7 tab list entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerListItem {
    pub name: String,
    pub online: bool,
    pub ping: i16,
}

impl ProtoEncode for PlayerListItem {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.name);
        buf.put_u8(self.online as u8);
        buf.put_i16(self.ping);
    }
}

/// Clientbound PluginMessage (0x3F).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMessageCb {
    pub channel: String,
    pub data: Vec<u8>,
}

impl ProtoEncode for PluginMessageCb {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.channel);
        buf.put_i16(self.data.len() as i16);
        buf.put_slice(&self.data);
    }
}

/// Serverbound PluginMessage (0x17). Unknown channels are ignored upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMessageSb {
    pub channel: String,
    pub data: Vec<u8>,
}

impl ProtoDecode for PluginMessageSb {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        let channel = read_string(buf, 20)?;
        ensure(buf, 2)?;
        let len = buf.get_i16();
        if len < 0 {
            return Err(ProtocolError::malformed("negative plugin message length"));
        }
        let len = len as usize;
        ensure(buf, len)?;
        Ok(Self {
            channel,
            data: buf.copy_to_bytes(len).to_vec(),
        })
    }
}

/// Play-phase Disconnect (0x40).
#[derive(Debug, Clone, PartialEq)]
pub struct Disconnect {
    pub reason_json: String,
}

impl ProtoEncode for Disconnect {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.reason_json);
    }
}
