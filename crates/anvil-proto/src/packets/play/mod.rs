//! Play phase packets.
//!
//! Id namespaces are per direction; `cb` is server→client, `sb` is
//! client→server.

pub mod action;
pub mod chat;
pub mod chunk;
pub mod entity;
pub mod join;
pub mod keep_alive;
pub mod movement;
pub mod session;
pub mod settings;
pub mod slot;
pub mod window;
pub mod world;

/// Clientbound packet ids.
pub mod cb {
    pub const KEEP_ALIVE: i32 = 0x00;
    pub const JOIN_GAME: i32 = 0x01;
    pub const CHAT: i32 = 0x02;
    pub const TIME_UPDATE: i32 = 0x03;
    pub const SPAWN_POSITION: i32 = 0x05;
    pub const UPDATE_HEALTH: i32 = 0x06;
    pub const RESPAWN: i32 = 0x07;
    pub const PLAYER_POS_AND_LOOK: i32 = 0x08;
    pub const HELD_ITEM_CHANGE: i32 = 0x09;
    pub const SPAWN_PLAYER: i32 = 0x0C;
    pub const DESTROY_ENTITIES: i32 = 0x13;
    pub const ENTITY_REL_MOVE: i32 = 0x15;
    pub const ENTITY_LOOK: i32 = 0x16;
    pub const ENTITY_LOOK_REL_MOVE: i32 = 0x17;
    pub const ENTITY_TELEPORT: i32 = 0x18;
    pub const ENTITY_HEAD_LOOK: i32 = 0x19;
    pub const ENTITY_STATUS: i32 = 0x1A;
    pub const SET_EXPERIENCE: i32 = 0x1F;
    pub const CHUNK_DATA: i32 = 0x21;
    pub const MULTI_BLOCK_CHANGE: i32 = 0x22;
    pub const BLOCK_CHANGE: i32 = 0x23;
    pub const MAP_CHUNK_BULK: i32 = 0x26;
    pub const CHANGE_GAME_STATE: i32 = 0x2B;
    pub const PLAYER_LIST_ITEM: i32 = 0x38;
    pub const PLAYER_ABILITIES: i32 = 0x39;
    pub const PLUGIN_MESSAGE: i32 = 0x3F;
    pub const DISCONNECT: i32 = 0x40;
}

/// Serverbound packet ids.
pub mod sb {
    pub const KEEP_ALIVE: i32 = 0x00;
    pub const CHAT: i32 = 0x01;
    pub const USE_ENTITY: i32 = 0x02;
    pub const PLAYER: i32 = 0x03;
    pub const PLAYER_POSITION: i32 = 0x04;
    pub const PLAYER_LOOK: i32 = 0x05;
    pub const PLAYER_POS_AND_LOOK: i32 = 0x06;
    pub const PLAYER_DIGGING: i32 = 0x07;
    pub const BLOCK_PLACE: i32 = 0x08;
    pub const HELD_ITEM_CHANGE: i32 = 0x09;
    pub const ANIMATION: i32 = 0x0A;
    pub const ENTITY_ACTION: i32 = 0x0B;
    pub const STEER_VEHICLE: i32 = 0x0C;
    pub const CLOSE_WINDOW: i32 = 0x0D;
    pub const CLICK_WINDOW: i32 = 0x0E;
    pub const CONFIRM_TRANSACTION: i32 = 0x0F;
    pub const CREATIVE_INVENTORY_ACTION: i32 = 0x10;
    pub const ENCHANT_ITEM: i32 = 0x11;
    pub const UPDATE_SIGN: i32 = 0x12;
    pub const PLAYER_ABILITIES: i32 = 0x13;
    pub const TAB_COMPLETE: i32 = 0x14;
    pub const CLIENT_SETTINGS: i32 = 0x15;
    pub const CLIENT_STATUS: i32 = 0x16;
    pub const PLUGIN_MESSAGE: i32 = 0x17;
}
