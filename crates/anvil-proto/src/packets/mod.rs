//! Typed packet structs, one module per phase / family.
//!
//! Ids are namespaced per (phase, direction). Every struct carries the
//! payload only; the id is supplied when framing.

pub mod handshake;
pub mod login;
pub mod play;
pub mod status;

use bytes::{Bytes, BytesMut};

use crate::codec::ProtoEncode;
use crate::types::VarInt;

/// Serialize a packet into a complete frame:
/// `VarInt(length) + VarInt(packet_id) + body`.
pub fn encode_framed(packet_id: i32, packet: &impl ProtoEncode) -> Bytes {
    let mut payload = BytesMut::with_capacity(64);
    VarInt(packet_id).proto_encode(&mut payload);
    packet.proto_encode(&mut payload);

    let mut framed = BytesMut::with_capacity(payload.len() + VarInt::MAX_BYTES);
    VarInt(payload.len() as i32).proto_encode(&mut framed);
    framed.extend_from_slice(&payload);
    framed.freeze()
}
