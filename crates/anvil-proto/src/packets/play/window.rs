//! Serverbound container packets.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;
use crate::packets::play::slot::Slot;

/// CloseWindow (0x0D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseWindow {
    pub window_id: u8,
}

impl ProtoDecode for CloseWindow {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 1)?;
        Ok(Self {
            window_id: buf.get_u8(),
        })
    }
}

/// ClickWindow (0x0E).
#[derive(Debug, Clone, PartialEq)]
pub struct ClickWindow {
    pub window_id: u8,
    pub slot: i16,
    pub button: i8,
    pub action_number: i16,
    pub mode: i8,
    pub clicked: Slot,
}

impl ProtoEncode for ClickWindow {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.window_id);
        buf.put_i16(self.slot);
        buf.put_i8(self.button);
        buf.put_i16(self.action_number);
        buf.put_i8(self.mode);
        self.clicked.proto_encode(buf);
    }
}

impl ProtoDecode for ClickWindow {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 7)?;
        Ok(Self {
            window_id: buf.get_u8(),
            slot: buf.get_i16(),
            button: buf.get_i8(),
            action_number: buf.get_i16(),
            mode: buf.get_i8(),
            clicked: Slot::proto_decode(buf)?,
        })
    }
}

/// ConfirmTransaction (0x0F).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmTransaction {
    pub window_id: u8,
    pub action_number: i16,
    pub accepted: bool,
}

impl ProtoDecode for ConfirmTransaction {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 4)?;
        Ok(Self {
            window_id: buf.get_u8(),
            action_number: buf.get_i16(),
            accepted: buf.get_u8() != 0,
        })
    }
}

/// CreativeInventoryAction (0x10).
#[derive(Debug, Clone, PartialEq)]
pub struct CreativeInventoryAction {
    pub slot: i16,
    pub item: Slot,
}

impl ProtoDecode for CreativeInventoryAction {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 2)?;
        Ok(Self {
            slot: buf.get_i16(),
            item: Slot::proto_decode(buf)?,
        })
    }
}

/// EnchantItem (0x11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnchantItem {
    pub window_id: u8,
    pub enchantment: i8,
}

impl ProtoDecode for EnchantItem {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure(buf, 2)?;
        Ok(Self {
            window_id: buf.get_u8(),
            enchantment: buf.get_i8(),
        })
    }
}
