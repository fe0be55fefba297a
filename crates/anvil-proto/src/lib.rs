//! Wire protocol for Minecraft 1.7.10 (protocol version 5).
//!
//! Everything on the wire is big-endian. Frames are VarInt length-prefixed;
//! each frame payload starts with a VarInt packet id whose meaning depends
//! on the connection phase (Handshake, Status, Login, Play).

pub mod chat;
pub mod codec;
pub mod compression;
pub mod error;
pub mod identity;
pub mod packets;
pub mod status;
pub mod types;

pub use error::ProtocolError;
pub use types::{VarInt, VarLong};

/// The one protocol number this server speaks (1.7.10).
pub const PROTOCOL_VERSION: i32 = 5;

/// Human-readable game version matching [`PROTOCOL_VERSION`].
pub const GAME_VERSION: &str = "1.7.10";

/// Largest allowed frame payload (2 MiB).
pub const MAX_FRAME_LEN: usize = 2 * 1024 * 1024;

/// Connection phase. Transitions are strictly forward:
/// `Handshake -> {Status, Login}`, `Login -> Play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Handshake,
    Status,
    Login,
    Play,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Handshake => "handshake",
            Phase::Status => "status",
            Phase::Login => "login",
            Phase::Play => "play",
        }
    }
}
