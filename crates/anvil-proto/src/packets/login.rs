//! Login phase packets (offline mode).

use bytes::{Buf, BufMut};

use crate::codec::{read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;

pub const DISCONNECT: i32 = 0x00;
pub const LOGIN_SUCCESS: i32 = 0x02;
pub const LOGIN_START: i32 = 0x00;
pub const ENCRYPTION_RESPONSE: i32 = 0x01;

/// Serverbound: the client announces its name.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginStart {
    pub name: String,
}

impl ProtoEncode for LoginStart {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.name);
    }
}

impl ProtoDecode for LoginStart {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        Ok(Self {
            name: read_string(buf, 16)?,
        })
    }
}

/// Clientbound: identity assignment, transitions the connection to Play.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSuccess {
    /// Hyphenated textual form, e.g. `069a79f4-44e9-4726-a5be-fca90e38aaf5`.
    pub uuid: String,
    pub name: String,
}

impl ProtoEncode for LoginSuccess {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.uuid);
        write_string(buf, &self.name);
    }
}

impl ProtoDecode for LoginSuccess {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        Ok(Self {
            uuid: read_string(buf, 36)?,
            name: read_string(buf, 16)?,
        })
    }
}

/// Clientbound: kick with a JSON chat component reason.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginDisconnect {
    pub reason_json: String,
}

impl ProtoEncode for LoginDisconnect {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.reason_json);
    }
}

impl ProtoDecode for LoginDisconnect {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        Ok(Self {
            reason_json: read_string(buf, 32767)?,
        })
    }
}
