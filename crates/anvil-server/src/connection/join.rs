//! The Play-phase join sequence and chunk streaming.

use tracing::warn;

use anvil_net::ConnectionId;
use anvil_proto::chat::ChatComponent;
use anvil_proto::compression::deflate_zlib;
use anvil_proto::packets::play::chunk::{BulkChunkMeta, ChunkData, MapChunkBulk};
use anvil_proto::packets::play::entity::SpawnPlayer;
use anvil_proto::packets::play::join::{
    HeldItemChangeCb, JoinGame, PlayerAbilities, PlayerPosAndLook, SpawnPosition,
};
use anvil_proto::packets::play::session::{PlayerListItem, UpdateHealth};
use anvil_proto::packets::play::world::TimeUpdate;
use anvil_proto::packets::play::cb;
use anvil_world::wire::extract_chunk;

use super::ConnectionHandler;

/// Client camera sits this far above the feet; the clientbound position
/// packet carries the eye y.
pub(super) const EYE_HEIGHT: f64 = 1.62;

/// Columns per MapChunkBulk packet.
const BULK_CHUNK_LIMIT: usize = 10;

impl ConnectionHandler {
    pub(super) async fn send_join_sequence(&mut self, conn: ConnectionId) {
        let Some(session) = self
            .connections
            .get(&conn)
            .and_then(|c| c.session.as_ref())
        else {
            return;
        };
        let entity_id = session.entity_id;
        let name = session.name.clone();
        let uuid = session.uuid.to_string();
        let gamemode = session.gamemode;
        let (x, y, z) = (session.x, session.y, session.z);
        let (yaw, pitch, on_ground) = (session.yaw, session.pitch, session.on_ground);
        let (held_slot, health, food, saturation) = (
            session.held_slot,
            session.health,
            session.food,
            session.saturation,
        );

        let (spawn_x, spawn_y, spawn_z) = self.world.spawn();

        self.send(
            conn,
            cb::JOIN_GAME,
            &JoinGame {
                entity_id,
                gamemode,
                dimension: self.world.dimension() as i8,
                difficulty: self.config.server.difficulty,
                max_players: self.config.server.max_players.min(u8::MAX as u32) as u8,
                level_type: self.config.world.generator.clone(),
            },
        )
        .await;

        self.send(
            conn,
            cb::SPAWN_POSITION,
            &SpawnPosition {
                x: spawn_x,
                y: spawn_y,
                z: spawn_z,
            },
        )
        .await;

        let mut flags = 0u8;
        if gamemode == 1 {
            flags |= PlayerAbilities::INVULNERABLE
                | PlayerAbilities::ALLOW_FLYING
                | PlayerAbilities::CREATIVE;
        }
        self.send(
            conn,
            cb::PLAYER_ABILITIES,
            &PlayerAbilities {
                flags,
                fly_speed: 0.05,
                walk_speed: 0.1,
            },
        )
        .await;

        self.send(
            conn,
            cb::PLAYER_POS_AND_LOOK,
            &PlayerPosAndLook {
                x,
                y: y + EYE_HEIGHT,
                z,
                yaw,
                pitch,
                on_ground,
            },
        )
        .await;

        self.stream_chunks(conn).await;

        self.send(
            conn,
            cb::TIME_UPDATE,
            &TimeUpdate {
                world_age: self.world.total_time(),
                time_of_day: self.world.time_of_day(),
            },
        )
        .await;
        self.send(
            conn,
            cb::HELD_ITEM_CHANGE,
            &HeldItemChangeCb {
                slot: held_slot as i8,
            },
        )
        .await;
        self.send(
            conn,
            cb::UPDATE_HEALTH,
            &UpdateHealth {
                health,
                food,
                saturation,
            },
        )
        .await;

        self.announce_join(conn, entity_id, &name, &uuid, x, y, z, yaw, pitch)
            .await;
    }

    /// Tab list, entity spawns, and the join message, in both directions.
    #[allow(clippy::too_many_arguments)]
    async fn announce_join(
        &mut self,
        conn: ConnectionId,
        entity_id: i32,
        name: &str,
        uuid: &str,
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
    ) {
        self.broadcast(
            cb::PLAYER_LIST_ITEM,
            &PlayerListItem {
                name: name.to_string(),
                online: true,
                ping: 0,
            },
        )
        .await;

        self.broadcast_except(
            conn,
            cb::SPAWN_PLAYER,
            &SpawnPlayer {
                entity_id,
                uuid: uuid.to_string(),
                name: name.to_string(),
                x,
                y,
                z,
                yaw,
                pitch,
                current_item: 0,
            },
        )
        .await;

        // Existing roster for the joiner.
        let others: Vec<SpawnPlayer> = self
            .connections
            .values()
            .filter(|c| c.id != conn)
            .filter_map(|c| c.session.as_ref())
            .map(|s| SpawnPlayer {
                entity_id: s.entity_id,
                uuid: s.uuid.to_string(),
                name: s.name.clone(),
                x: s.x,
                y: s.y,
                z: s.z,
                yaw: s.yaw,
                pitch: s.pitch,
                current_item: 0,
            })
            .collect();
        let other_names: Vec<String> = self
            .connections
            .values()
            .filter(|c| c.id != conn)
            .filter_map(|c| c.session.as_ref())
            .map(|s| s.name.clone())
            .collect();
        for other in other_names {
            self.send(
                conn,
                cb::PLAYER_LIST_ITEM,
                &PlayerListItem {
                    name: other,
                    online: true,
                    ping: 0,
                },
            )
            .await;
        }
        for spawn in others {
            self.send(conn, cb::SPAWN_PLAYER, &spawn).await;
        }

        self.broadcast_chat(&ChatComponent::colored(
            format!("{name} joined the game"),
            "yellow",
        ))
        .await;
    }

    /// Bring the client's held columns in line with its view radius:
    /// stream newly visible columns in bulk batches, unload departed ones,
    /// and queue provider drops for columns nobody watches anymore.
    pub(super) async fn stream_chunks(&mut self, conn: ConnectionId) {
        let Some(session) = self
            .connections
            .get(&conn)
            .and_then(|c| c.session.as_ref())
        else {
            return;
        };
        let (center_x, center_z) = session.chunk_pos();
        let radius = self
            .config
            .server
            .view_distance
            .min(session.view_distance.max(2) as i32);
        let already = session.sent_chunks.clone();

        // Wanted columns, nearest rings first.
        let mut wanted = Vec::new();
        for r in 0..=radius {
            for dz in -r..=r {
                for dx in -r..=r {
                    if dx.abs().max(dz.abs()) == r {
                        wanted.push((center_x + dx, center_z + dz));
                    }
                }
            }
        }
        let wanted_set: std::collections::HashSet<(i32, i32)> = wanted.iter().copied().collect();

        // Stream the missing ones.
        let mut batch_raw = Vec::new();
        let mut batch_metas: Vec<BulkChunkMeta> = Vec::new();
        let mut streamed = Vec::new();
        for &(cx, cz) in wanted.iter().filter(|c| !already.contains(c)) {
            if let Err(e) = self.world.load_chunk(cx, cz) {
                warn!(cx, cz, "chunk load failed: {e}");
                continue;
            }
            let Some(extracted) = self
                .world
                .with_chunk(cx, cz, |chunk| extract_chunk(chunk, true, 0xFFFF))
            else {
                continue;
            };
            batch_metas.push(BulkChunkMeta {
                chunk_x: cx,
                chunk_z: cz,
                primary_bitmask: extracted.primary_bitmask,
                add_bitmask: extracted.add_bitmask,
            });
            batch_raw.extend_from_slice(&extracted.data);
            streamed.push((cx, cz));

            if batch_metas.len() >= BULK_CHUNK_LIMIT {
                self.flush_bulk(conn, &mut batch_raw, &mut batch_metas).await;
            }
        }
        self.flush_bulk(conn, &mut batch_raw, &mut batch_metas).await;

        // Unload columns that fell out of range.
        let to_unload: Vec<(i32, i32)> = already
            .iter()
            .filter(|c| !wanted_set.contains(c))
            .copied()
            .collect();
        for &(cx, cz) in &to_unload {
            self.send(conn, cb::CHUNK_DATA, &ChunkData::unload(cx, cz)).await;
        }

        if let Some(session) = self
            .connections
            .get_mut(&conn)
            .and_then(|c| c.session.as_mut())
        {
            for coords in streamed {
                session.sent_chunks.insert(coords);
            }
            for coords in &to_unload {
                session.sent_chunks.remove(coords);
            }
        }
        for (cx, cz) in to_unload {
            if !self.chunk_in_use(cx, cz) {
                self.world.provider().drop_chunk(cx, cz);
            }
        }
    }

    async fn flush_bulk(
        &self,
        conn: ConnectionId,
        batch_raw: &mut Vec<u8>,
        batch_metas: &mut Vec<BulkChunkMeta>,
    ) {
        if batch_metas.is_empty() {
            return;
        }
        let packet = MapChunkBulk {
            sky_light: self.world.has_sky(),
            compressed: deflate_zlib(batch_raw),
            metas: std::mem::take(batch_metas),
        };
        batch_raw.clear();
        self.send(conn, cb::MAP_CHUNK_BULK, &packet).await;
    }
}
