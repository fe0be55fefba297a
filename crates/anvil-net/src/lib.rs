//! TCP transport: acceptor, per-connection tasks, VarInt framing.
//!
//! The consumer receives [`NetEvent`]s over a channel and talks back
//! through a cloneable [`ServerHandle`]. Frames handed to `send` must
//! already carry their length prefix (see `anvil_proto::packets::encode_framed`).

pub mod connection;
pub mod error;
pub mod frame;
pub mod server;

pub use error::NetError;
pub use server::{ConnectionId, NetEvent, NetServer, ServerHandle};
