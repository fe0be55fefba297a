//! Per-connection state machine and the simulation-side handler.
//!
//! The handler owns every connection, every player session, and the world.
//! It runs on the single simulation task: network tasks only parse frames
//! into the event channel, and everything here mutates state in dispatch
//! order.

mod commands;
mod join;
mod login;
mod mechanics;
mod play;
mod status;
mod world_tick;

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use anvil_net::{ConnectionId, NetEvent, ServerHandle};
use anvil_proto::chat::ChatComponent;
use anvil_proto::codec::{ProtoDecode, ProtoEncode};
use anvil_proto::error::ProtocolError;
use anvil_proto::packets::play::slot::Slot;
use anvil_proto::packets::play::{cb, session::Disconnect};
use anvil_proto::packets::login::LoginDisconnect;
use anvil_proto::packets::{encode_framed, login as login_ids};
use anvil_proto::types::VarInt;
use anvil_proto::Phase;
use anvil_world::{
    BlockRegistry, ChunkGenerator, FlatGenerator, ItemRegistry, LevelDat, TickScheduler, World,
};

use crate::config::ServerConfig;
use crate::persistence::PlayerData;

/// Ticks between keep-alive sends (15 s).
const KEEPALIVE_INTERVAL: u64 = 300;
/// Ticks a client may go without echoing before it is dropped (30 s).
const KEEPALIVE_TIMEOUT: u64 = 600;
/// Ticks allowed between handshake and LoginStart.
const LOGIN_TIMEOUT: u64 = 600;

/// Everything the server tracks for one player in the Play phase.
pub struct PlayerSession {
    pub entity_id: i32,
    pub name: String,
    pub uuid: Uuid,
    /// Feet position.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
    pub health: f32,
    pub food: i32,
    pub saturation: f32,
    pub exhaustion: f32,
    pub food_timer: u32,
    pub xp_level: i32,
    pub xp_total: i32,
    pub xp_progress: f32,
    pub gamemode: u8,
    pub dimension: i32,
    pub fall_distance: f32,
    pub held_slot: u8,
    /// Inventory snapshot in `.dat` slot order: 0-8 hotbar, 9-35 main.
    pub inventory: Vec<Slot>,
    pub flying: bool,
    pub allow_flying: bool,
    pub sneaking: bool,
    pub sprinting: bool,
    pub locale: String,
    pub view_distance: i8,
    pub chat_colors: bool,
    pub skin_parts: u8,
    /// Columns this client currently holds.
    pub sent_chunks: HashSet<(i32, i32)>,
    /// Fixed-point position of the last broadcast, for relative moves.
    pub last_sent_fixed: (i32, i32, i32),
    pub keepalive_id: i32,
    pub keepalive_pending: bool,
    pub keepalive_sent_tick: u64,
    pub last_response_tick: u64,
}

impl PlayerSession {
    fn new(entity_id: i32, name: String, uuid: Uuid, now_tick: u64) -> Self {
        Self {
            entity_id,
            name,
            uuid,
            x: 0.0,
            y: 64.0,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: false,
            health: 20.0,
            food: 20,
            saturation: 5.0,
            exhaustion: 0.0,
            food_timer: 0,
            xp_level: 0,
            xp_total: 0,
            xp_progress: 0.0,
            gamemode: 0,
            dimension: 0,
            fall_distance: 0.0,
            held_slot: 0,
            inventory: vec![Slot::EMPTY; 36],
            flying: false,
            allow_flying: false,
            sneaking: false,
            sprinting: false,
            locale: "en_US".into(),
            view_distance: 8,
            chat_colors: true,
            skin_parts: 0,
            sent_chunks: HashSet::new(),
            last_sent_fixed: (0, 0, 0),
            keepalive_id: 0,
            keepalive_pending: false,
            keepalive_sent_tick: now_tick,
            last_response_tick: now_tick,
        }
    }

    pub fn chunk_pos(&self) -> (i32, i32) {
        ((self.x.floor() as i32) >> 4, (self.z.floor() as i32) >> 4)
    }

    /// Inventory snapshot uses the `.dat` slot order: 0-8 hotbar, 9-35 main.
    pub fn held_item(&self) -> &Slot {
        &self.inventory[self.held_slot as usize]
    }

    pub fn held_item_mut(&mut self) -> &mut Slot {
        &mut self.inventory[self.held_slot as usize]
    }
}

/// One accepted socket and its protocol phase.
pub struct ClientConnection {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub phase: Phase,
    /// Tick by which LoginStart must arrive, set when the handshake picks
    /// the login path.
    pub login_deadline: Option<u64>,
    pub session: Option<PlayerSession>,
}

/// Owns all connections, sessions, and the world. Single mutator.
pub struct ConnectionHandler {
    handle: ServerHandle,
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) world: World,
    pub(crate) level: LevelDat,
    world_dir: PathBuf,
    pub(crate) block_registry: Arc<BlockRegistry>,
    #[allow(dead_code)]
    pub(crate) item_registry: Arc<ItemRegistry>,
    pub(crate) connections: HashMap<ConnectionId, ClientConnection>,
    pub(crate) scheduler: TickScheduler,
    pub(crate) rng: StdRng,
    pub(crate) tick: u64,
    next_entity_id: i32,
    keepalive_seq: i32,
    favicon: Option<Vec<u8>>,
    auto_save_interval_ticks: u64,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl ConnectionHandler {
    pub fn new(
        handle: ServerHandle,
        config: Arc<ServerConfig>,
        shutdown_tx: Arc<watch::Sender<bool>>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let block_registry = Arc::new(BlockRegistry::vanilla());
        let item_registry = Arc::new(ItemRegistry::vanilla());

        let world_dir = PathBuf::from("worlds").join(&config.world.name);
        std::fs::create_dir_all(world_dir.join("region"))?;
        std::fs::create_dir_all(world_dir.join("playerdata"))?;

        let generator = Box::new(FlatGenerator::new(block_registry.clone(), true));
        let surface_y = generator.surface_y();
        let mut world = World::new(
            0,
            config.world.seed,
            world_dir.join("region"),
            generator,
            block_registry.clone(),
        );

        let level_path = world_dir.join("level.dat");
        let level = if level_path.exists() {
            match LevelDat::load(&level_path) {
                Ok(level) => level,
                Err(e) => {
                    warn!("failed to load level.dat ({e}), creating new");
                    LevelDat::new(
                        &config.world.name,
                        config.world.seed,
                        &config.world.generator,
                        (8, surface_y, 8),
                    )
                }
            }
        } else {
            let level = LevelDat::new(
                &config.world.name,
                config.world.seed,
                &config.world.generator,
                (8, surface_y, 8),
            );
            if let Err(e) = level.save(&level_path) {
                warn!("failed to write initial level.dat: {e}");
            }
            level
        };

        world.set_spawn(level.spawn_x, level.spawn_y, level.spawn_z);
        world.set_clock(level.time, level.day_time);

        // Keep the spawn area resident from the start.
        let (scx, scz) = (level.spawn_x >> 4, level.spawn_z >> 4);
        for cz in scz - 2..=scz + 2 {
            for cx in scx - 2..=scx + 2 {
                if let Err(e) = world.load_chunk(cx, cz) {
                    warn!(cx, cz, "spawn chunk load failed: {e}");
                }
            }
        }
        info!(
            "world \"{}\" ready, spawn at ({}, {}, {})",
            config.world.name, level.spawn_x, level.spawn_y, level.spawn_z
        );

        let favicon = std::fs::read("server-icon.png").ok();
        let auto_save_interval_ticks = config.world.auto_save_interval * 20;

        Ok(Self {
            handle,
            config,
            world,
            level,
            world_dir,
            block_registry,
            item_registry,
            connections: HashMap::new(),
            scheduler: TickScheduler::new(),
            rng: StdRng::from_entropy(),
            tick: 0,
            next_entity_id: 1,
            keepalive_seq: 0,
            favicon,
            auto_save_interval_ticks,
            shutdown_tx,
        })
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn favicon(&self) -> Option<&[u8]> {
        self.favicon.as_deref()
    }

    pub(crate) fn world_dir(&self) -> &PathBuf {
        &self.world_dir
    }

    pub(crate) fn request_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub(crate) fn next_entity_id(&mut self) -> i32 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    pub(crate) fn next_keepalive_id(&mut self) -> i32 {
        self.keepalive_seq = self.keepalive_seq.wrapping_add(1).max(1);
        self.keepalive_seq
    }

    pub(crate) fn online_count(&self) -> usize {
        self.connections
            .values()
            .filter(|c| c.phase == Phase::Play && c.session.is_some())
            .count()
    }

    pub(crate) fn player_names(&self) -> Vec<String> {
        self.connections
            .values()
            .filter_map(|c| c.session.as_ref())
            .map(|s| s.name.clone())
            .collect()
    }

    // --- event entry points ----------------------------------------------

    pub async fn handle_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Connected { conn, addr } => {
                self.connections.insert(
                    conn,
                    ClientConnection {
                        id: conn,
                        addr,
                        phase: Phase::Handshake,
                        login_deadline: None,
                        session: None,
                    },
                );
            }
            NetEvent::Frame { conn, payload } => {
                self.handle_frame(conn, payload).await;
            }
            NetEvent::Closed { conn, reason } => {
                self.finish_connection(conn, &reason).await;
            }
        }
    }

    async fn handle_frame(&mut self, conn: ConnectionId, payload: Bytes) {
        let Some(phase) = self.connections.get(&conn).map(|c| c.phase) else {
            return; // raced with removal
        };

        let mut buf = payload;
        let packet_id = match VarInt::proto_decode(&mut buf) {
            Ok(id) => id.0,
            Err(e) => {
                self.protocol_error(conn, phase, e).await;
                return;
            }
        };

        let result = match phase {
            Phase::Handshake => self.handle_handshake(conn, packet_id, &mut buf).await,
            Phase::Status => self.handle_status(conn, packet_id, &mut buf).await,
            Phase::Login => self.handle_login(conn, packet_id, &mut buf).await,
            Phase::Play => self.handle_play(conn, packet_id, &mut buf).await,
        };

        if let Err(e) = result {
            self.protocol_error(conn, phase, e).await;
        }
    }

    /// Handshake: exactly one packet, which routes to Status or Login and
    /// enforces the protocol version on the login path.
    async fn handle_handshake(
        &mut self,
        conn: ConnectionId,
        packet_id: i32,
        buf: &mut Bytes,
    ) -> Result<(), ProtocolError> {
        use anvil_proto::packets::handshake::{Handshake, HANDSHAKE};

        if packet_id != HANDSHAKE {
            return Err(ProtocolError::UnknownPacketId {
                phase: "handshake",
                id: packet_id,
            });
        }
        let handshake = Handshake::proto_decode(buf)?;
        debug!(
            conn = conn.0,
            protocol = handshake.protocol_version,
            next = handshake.next_state,
            "handshake"
        );

        match handshake.next_state {
            1 => {
                self.set_phase(conn, Phase::Status);
                Ok(())
            }
            2 => {
                self.set_phase(conn, Phase::Login);
                if handshake.protocol_version != anvil_proto::PROTOCOL_VERSION {
                    let reason = if handshake.protocol_version > anvil_proto::PROTOCOL_VERSION {
                        anvil_proto::chat::outdated_server_json()
                    } else {
                        anvil_proto::chat::outdated_client_json()
                    };
                    self.send(
                        conn,
                        login_ids::DISCONNECT,
                        &LoginDisconnect { reason_json: reason },
                    )
                    .await;
                    self.handle.disconnect(conn).await;
                    return Ok(());
                }
                if let Some(c) = self.connections.get_mut(&conn) {
                    c.login_deadline = Some(self.tick + LOGIN_TIMEOUT);
                }
                Ok(())
            }
            other => Err(ProtocolError::malformed(format!("invalid intention {other}"))),
        }
    }

    pub(crate) fn set_phase(&mut self, conn: ConnectionId, phase: Phase) {
        if let Some(c) = self.connections.get_mut(&conn) {
            c.phase = phase;
        }
    }

    // --- outbound helpers -------------------------------------------------

    /// Frame and queue one packet for one connection.
    pub(crate) async fn send(
        &self,
        conn: ConnectionId,
        packet_id: i32,
        packet: &impl ProtoEncode,
    ) {
        self.handle.send(conn, encode_framed(packet_id, packet)).await;
    }

    /// Queue a packet for every Play-phase connection.
    pub(crate) async fn broadcast(&self, packet_id: i32, packet: &impl ProtoEncode) {
        let frame = encode_framed(packet_id, packet);
        for c in self.connections.values() {
            if c.phase == Phase::Play && c.session.is_some() {
                self.handle.send(c.id, frame.clone()).await;
            }
        }
    }

    /// Queue a packet for every Play-phase connection except one.
    pub(crate) async fn broadcast_except(
        &self,
        skip: ConnectionId,
        packet_id: i32,
        packet: &impl ProtoEncode,
    ) {
        let frame = encode_framed(packet_id, packet);
        for c in self.connections.values() {
            if c.id != skip && c.phase == Phase::Play && c.session.is_some() {
                self.handle.send(c.id, frame.clone()).await;
            }
        }
    }

    pub(crate) async fn broadcast_chat(&self, component: &ChatComponent) {
        self.broadcast(
            cb::CHAT,
            &anvil_proto::packets::play::chat::ChatMessageCb {
                json: component.to_json(),
            },
        )
        .await;
    }

    /// Kick with a readable reason using the phase's disconnect packet,
    /// then close the socket.
    pub(crate) async fn kick(&mut self, conn: ConnectionId, reason: &str) {
        let phase = self.connections.get(&conn).map(|c| c.phase);
        let json = ChatComponent::text(reason).to_json();
        match phase {
            Some(Phase::Login) => {
                self.send(conn, login_ids::DISCONNECT, &LoginDisconnect { reason_json: json })
                    .await;
            }
            Some(Phase::Play) => {
                self.send(conn, cb::DISCONNECT, &Disconnect { reason_json: json })
                    .await;
            }
            _ => {}
        }
        self.handle.disconnect(conn).await;
    }

    /// Close after a protocol violation. Login-phase errors carry a reason
    /// packet; everything else just drops.
    async fn protocol_error(&mut self, conn: ConnectionId, phase: Phase, error: ProtocolError) {
        warn!(conn = conn.0, phase = phase.name(), %error, "protocol error");
        if phase == Phase::Login {
            let json = ChatComponent::text(format!("Protocol error: {error}")).to_json();
            self.send(conn, login_ids::DISCONNECT, &LoginDisconnect { reason_json: json })
                .await;
        }
        self.handle.disconnect(conn).await;
    }

    /// The socket is gone: persist and announce the departure.
    async fn finish_connection(&mut self, conn: ConnectionId, reason: &str) {
        let Some(client) = self.connections.remove(&conn) else {
            return;
        };
        let Some(session) = client.session else {
            return;
        };
        info!(player = %session.name, %reason, "player left");

        if let Err(e) = PlayerData::from_session(&session).save(&self.world_dir, &session.uuid) {
            warn!(player = %session.name, "failed to save player data: {e}");
        }

        // Columns only this client was holding can queue for eviction.
        for &(cx, cz) in &session.sent_chunks {
            if !self.chunk_in_use(cx, cz) {
                self.world.provider().drop_chunk(cx, cz);
            }
        }

        self.broadcast(
            cb::PLAYER_LIST_ITEM,
            &anvil_proto::packets::play::session::PlayerListItem {
                name: session.name.clone(),
                online: false,
                ping: 0,
            },
        )
        .await;
        self.broadcast(
            cb::DESTROY_ENTITIES,
            &anvil_proto::packets::play::entity::DestroyEntities {
                entity_ids: vec![session.entity_id],
            },
        )
        .await;
        self.broadcast_chat(&ChatComponent::colored(
            format!("{} left the game", session.name),
            "yellow",
        ))
        .await;
    }

    pub(crate) fn chunk_in_use(&self, cx: i32, cz: i32) -> bool {
        self.connections
            .values()
            .filter_map(|c| c.session.as_ref())
            .any(|s| s.sent_chunks.contains(&(cx, cz)))
    }

    /// Save everything: chunks, level metadata, online players.
    pub fn save_all(&mut self) {
        let saved = self.world.save_all();
        self.level.time = self.world.total_time();
        self.level.day_time = self.world.day_time();
        let (sx, sy, sz) = self.world.spawn();
        self.level.spawn_x = sx;
        self.level.spawn_y = sy;
        self.level.spawn_z = sz;
        if let Err(e) = self.level.save(&self.world_dir.join("level.dat")) {
            warn!("failed to save level.dat: {e}");
        }
        let mut players = 0;
        for client in self.connections.values() {
            if let Some(session) = &client.session {
                match PlayerData::from_session(session).save(&self.world_dir, &session.uuid) {
                    Ok(()) => players += 1,
                    Err(e) => warn!(player = %session.name, "player save failed: {e}"),
                }
            }
        }
        info!("saved {saved} chunks and {players} players");
    }
}
