//! Serverbound Play packet dispatch.
//!
//! Client-driven session updates apply in dispatch order. Packets the
//! server has no behavior for are still parsed so the stream stays
//! aligned; unknown ids close the connection.

use bytes::Bytes;
use tracing::{debug, trace};

use anvil_net::ConnectionId;
use anvil_proto::chat::ChatComponent;
use anvil_proto::codec::{to_fixed_point, ProtoDecode};
use anvil_proto::error::ProtocolError;
use anvil_proto::packets::play::action::{
    dig_status, Animation, BlockPlace, ClientStatus, EntityAction, HeldItemChangeSb,
    PlayerDigging,
};
use anvil_proto::packets::play::chat::ChatMessageSb;
use anvil_proto::packets::play::entity::{
    EntityHeadLook, EntityLook, EntityLookRelMove, EntityRelMove, EntityTeleport, UseEntity,
};
use anvil_proto::packets::play::join::PlayerAbilities;
use anvil_proto::packets::play::keep_alive::KeepAlive;
use anvil_proto::packets::play::movement::{
    PlayerGround, PlayerLook, PlayerPosAndLookSb, PlayerPosition,
};
use anvil_proto::packets::play::session::PluginMessageSb;
use anvil_proto::packets::play::settings::{
    ClientSettings, SteerVehicle, TabComplete, UpdateSign,
};
use anvil_proto::packets::play::slot::Slot;
use anvil_proto::packets::play::window::{
    ClickWindow, CloseWindow, ConfirmTransaction, CreativeInventoryAction, EnchantItem,
};
use anvil_proto::packets::play::world::BlockChange;
use anvil_proto::packets::play::{cb, sb};

use super::{mechanics, ConnectionHandler};

/// Blocks a player can reach from the eye position.
const REACH_DISTANCE: f64 = 6.0;

impl ConnectionHandler {
    pub(super) async fn handle_play(
        &mut self,
        conn: ConnectionId,
        packet_id: i32,
        buf: &mut Bytes,
    ) -> Result<(), ProtocolError> {
        match packet_id {
            sb::KEEP_ALIVE => {
                let pkt = KeepAlive::proto_decode(buf)?;
                self.handle_keep_alive(conn, pkt.id);
                Ok(())
            }
            sb::CHAT => {
                let pkt = ChatMessageSb::proto_decode(buf)?;
                self.handle_chat(conn, pkt.message).await;
                Ok(())
            }
            sb::USE_ENTITY => {
                let _ = UseEntity::proto_decode(buf)?;
                Ok(())
            }
            sb::PLAYER => {
                let pkt = PlayerGround::proto_decode(buf)?;
                self.apply_movement(conn, None, None, pkt.on_ground).await;
                Ok(())
            }
            sb::PLAYER_POSITION => {
                // head_y is a legacy field: parsed, then dropped.
                let pkt = PlayerPosition::proto_decode(buf)?;
                self.apply_movement(conn, Some((pkt.x, pkt.feet_y, pkt.z)), None, pkt.on_ground)
                    .await;
                Ok(())
            }
            sb::PLAYER_LOOK => {
                let pkt = PlayerLook::proto_decode(buf)?;
                self.apply_movement(conn, None, Some((pkt.yaw, pkt.pitch)), pkt.on_ground)
                    .await;
                Ok(())
            }
            sb::PLAYER_POS_AND_LOOK => {
                let pkt = PlayerPosAndLookSb::proto_decode(buf)?;
                self.apply_movement(
                    conn,
                    Some((pkt.x, pkt.feet_y, pkt.z)),
                    Some((pkt.yaw, pkt.pitch)),
                    pkt.on_ground,
                )
                .await;
                Ok(())
            }
            sb::PLAYER_DIGGING => {
                let pkt = PlayerDigging::proto_decode(buf)?;
                self.handle_digging(conn, pkt).await;
                Ok(())
            }
            sb::BLOCK_PLACE => {
                let pkt = BlockPlace::proto_decode(buf)?;
                self.handle_block_place(conn, pkt).await;
                Ok(())
            }
            sb::HELD_ITEM_CHANGE => {
                let pkt = HeldItemChangeSb::proto_decode(buf)?;
                if (0..=8).contains(&pkt.slot) {
                    if let Some(session) = self.session_mut(conn) {
                        session.held_slot = pkt.slot as u8;
                    }
                }
                Ok(())
            }
            sb::ANIMATION => {
                let _ = Animation::proto_decode(buf)?;
                Ok(())
            }
            sb::ENTITY_ACTION => {
                let pkt = EntityAction::proto_decode(buf)?;
                if let Some(session) = self.session_mut(conn) {
                    match pkt.action {
                        1 => session.sneaking = true,
                        2 => session.sneaking = false,
                        4 => session.sprinting = true,
                        5 => session.sprinting = false,
                        _ => {}
                    }
                }
                Ok(())
            }
            sb::STEER_VEHICLE => {
                let _ = SteerVehicle::proto_decode(buf)?;
                Ok(())
            }
            sb::CLOSE_WINDOW => {
                let _ = CloseWindow::proto_decode(buf)?;
                Ok(())
            }
            sb::CLICK_WINDOW => {
                // Container matching is outside the core; parsing keeps the
                // stream aligned.
                let _ = ClickWindow::proto_decode(buf)?;
                Ok(())
            }
            sb::CONFIRM_TRANSACTION => {
                let _ = ConfirmTransaction::proto_decode(buf)?;
                Ok(())
            }
            sb::CREATIVE_INVENTORY_ACTION => {
                let pkt = CreativeInventoryAction::proto_decode(buf)?;
                self.handle_creative_slot(conn, pkt);
                Ok(())
            }
            sb::ENCHANT_ITEM => {
                let _ = EnchantItem::proto_decode(buf)?;
                Ok(())
            }
            sb::UPDATE_SIGN => {
                let _ = UpdateSign::proto_decode(buf)?;
                Ok(())
            }
            sb::PLAYER_ABILITIES => {
                let pkt = PlayerAbilities::proto_decode(buf)?;
                self.handle_client_abilities(conn, pkt).await;
                Ok(())
            }
            sb::TAB_COMPLETE => {
                let _ = TabComplete::proto_decode(buf)?;
                Ok(())
            }
            sb::CLIENT_SETTINGS => {
                let pkt = ClientSettings::proto_decode(buf)?;
                if let Some(session) = self.session_mut(conn) {
                    session.locale = pkt.locale;
                    session.view_distance = pkt.view_distance;
                    session.chat_colors = pkt.chat_colors;
                    session.skin_parts = pkt.skin_parts;
                }
                self.stream_chunks(conn).await;
                Ok(())
            }
            sb::CLIENT_STATUS => {
                let _ = ClientStatus::proto_decode(buf)?;
                Ok(())
            }
            sb::PLUGIN_MESSAGE => {
                let pkt = PluginMessageSb::proto_decode(buf)?;
                trace!(conn = conn.0, channel = %pkt.channel, len = pkt.data.len(),
                       "plugin message");
                Ok(())
            }
            other => Err(ProtocolError::UnknownPacketId {
                phase: "play",
                id: other,
            }),
        }
    }

    fn session_mut(&mut self, conn: ConnectionId) -> Option<&mut super::PlayerSession> {
        self.connections
            .get_mut(&conn)
            .and_then(|c| c.session.as_mut())
    }

    fn session(&self, conn: ConnectionId) -> Option<&super::PlayerSession> {
        self.connections.get(&conn).and_then(|c| c.session.as_ref())
    }

    // --- keep-alive -------------------------------------------------------

    fn handle_keep_alive(&mut self, conn: ConnectionId, id: i32) {
        let tick = self.tick;
        if let Some(session) = self.session_mut(conn) {
            // A mismatched id is ignored; the timeout clock keeps running.
            if session.keepalive_pending && session.keepalive_id == id {
                session.keepalive_pending = false;
                session.last_response_tick = tick;
            }
        }
    }

    // --- chat -------------------------------------------------------------

    async fn handle_chat(&mut self, conn: ConnectionId, message: String) {
        let Some(session) = self.session(conn) else {
            return;
        };
        let name = session.name.clone();
        if let Some(command) = message.strip_prefix('/') {
            let command = command.to_string();
            self.handle_player_command(conn, &command).await;
            return;
        }
        debug!(player = %name, %message, "chat");
        self.broadcast_chat(&ChatComponent::text(format!("<{name}> {message}")))
            .await;
    }

    // --- movement ---------------------------------------------------------

    async fn apply_movement(
        &mut self,
        conn: ConnectionId,
        new_pos: Option<(f64, f64, f64)>,
        new_look: Option<(f32, f32)>,
        on_ground: bool,
    ) {
        let Some(session) = self.session_mut(conn) else {
            return;
        };
        let entity_id = session.entity_id;
        let old_chunk = session.chunk_pos();

        if let Some((x, y, z)) = new_pos {
            if !x.is_finite() || !y.is_finite() || !z.is_finite() {
                return;
            }
            let dy = y - session.y;
            if !on_ground && dy < 0.0 {
                session.fall_distance += -dy as f32;
            } else if on_ground {
                session.fall_distance = 0.0;
            }
            session.x = x;
            session.y = y;
            session.z = z;
        }
        if let Some((yaw, pitch)) = new_look {
            session.yaw = yaw;
            session.pitch = pitch;
        }
        session.on_ground = on_ground;

        // Work out the broadcast while the session borrow is live.
        let (yaw, pitch) = (session.yaw, session.pitch);
        let mut teleport = None;
        let mut rel = None;
        if new_pos.is_some() {
            let fixed = (
                to_fixed_point(session.x),
                to_fixed_point(session.y),
                to_fixed_point(session.z),
            );
            let (lx, ly, lz) = session.last_sent_fixed;
            let (dx, dy, dz) = (fixed.0 - lx, fixed.1 - ly, fixed.2 - lz);
            let fits = |d: i32| (-128..=127).contains(&d);
            if fits(dx) && fits(dy) && fits(dz) {
                rel = Some((dx as i8, dy as i8, dz as i8));
                session.last_sent_fixed = (lx + dx, ly + dy, lz + dz);
            } else {
                teleport = Some((session.x, session.y, session.z));
                session.last_sent_fixed = fixed;
            }
        }
        let new_chunk = session.chunk_pos();

        match (teleport, rel, new_look) {
            (Some((x, y, z)), _, _) => {
                self.broadcast_except(
                    conn,
                    cb::ENTITY_TELEPORT,
                    &EntityTeleport {
                        entity_id,
                        x,
                        y,
                        z,
                        yaw,
                        pitch,
                    },
                )
                .await;
            }
            (None, Some((dx, dy, dz)), None) => {
                self.broadcast_except(
                    conn,
                    cb::ENTITY_REL_MOVE,
                    &EntityRelMove {
                        entity_id,
                        dx,
                        dy,
                        dz,
                    },
                )
                .await;
            }
            (None, Some((dx, dy, dz)), Some(_)) => {
                self.broadcast_except(
                    conn,
                    cb::ENTITY_LOOK_REL_MOVE,
                    &EntityLookRelMove {
                        entity_id,
                        dx,
                        dy,
                        dz,
                        yaw,
                        pitch,
                    },
                )
                .await;
            }
            (None, None, Some(_)) => {
                self.broadcast_except(
                    conn,
                    cb::ENTITY_LOOK,
                    &EntityLook {
                        entity_id,
                        yaw,
                        pitch,
                    },
                )
                .await;
            }
            (None, None, None) => {}
        }
        if new_look.is_some() {
            self.broadcast_except(
                conn,
                cb::ENTITY_HEAD_LOOK,
                &EntityHeadLook {
                    entity_id,
                    head_yaw: yaw,
                },
            )
            .await;
        }

        if new_chunk != old_chunk {
            self.stream_chunks(conn).await;
        }
    }

    // --- block interaction ------------------------------------------------

    /// Send the authoritative state of a block back to one client.
    async fn send_corrective_block(&self, conn: ConnectionId, x: i32, y: i32, z: i32) {
        let (id, meta) = self.world.get_block(x, y, z);
        self.send(
            conn,
            cb::BLOCK_CHANGE,
            &BlockChange {
                x,
                y: y.clamp(0, 255) as u8,
                z,
                block_id: id as i32,
                metadata: meta,
            },
        )
        .await;
    }

    fn within_reach(&self, conn: ConnectionId, x: i32, y: i32, z: i32) -> bool {
        let Some(session) = self.session(conn) else {
            return false;
        };
        let eye = (session.x, session.y + super::join::EYE_HEIGHT, session.z);
        let center = (x as f64 + 0.5, y as f64 + 0.5, z as f64 + 0.5);
        let dist2 = (eye.0 - center.0).powi(2)
            + (eye.1 - center.1).powi(2)
            + (eye.2 - center.2).powi(2);
        dist2 <= REACH_DISTANCE * REACH_DISTANCE
    }

    async fn handle_digging(&mut self, conn: ConnectionId, pkt: PlayerDigging) {
        let Some(session) = self.session(conn) else {
            return;
        };
        let creative = session.gamemode == 1;
        let (x, y, z) = (pkt.x, pkt.y as i32, pkt.z);

        let breaks = match pkt.status {
            dig_status::FINISH => true,
            dig_status::START => creative,
            _ => return, // cancel / drop / release need no world change
        };
        if !breaks {
            return;
        }

        if !(0..256).contains(&y) || !self.within_reach(conn, x, y, z) {
            self.send_corrective_block(conn, x, y, z).await;
            return;
        }
        let (current, _) = self.world.get_block(x, y, z);
        if current == 0 {
            return;
        }
        let unbreakable = self
            .block_registry
            .get(current)
            .map(|d| d.hardness < 0.0)
            .unwrap_or(false);
        if unbreakable && !creative {
            self.send_corrective_block(conn, x, y, z).await;
            return;
        }

        self.world.set_block(x, y, z, 0, 0);
        self.broadcast(
            cb::BLOCK_CHANGE,
            &BlockChange {
                x,
                y: y as u8,
                z,
                block_id: 0,
                metadata: 0,
            },
        )
        .await;
        mechanics::on_block_changed(self, x, y, z);
    }

    async fn handle_block_place(&mut self, conn: ConnectionId, pkt: BlockPlace) {
        if pkt.direction < 0 {
            return; // "use item" form, no block target
        }
        let Some(session) = self.session(conn) else {
            return;
        };
        let creative = session.gamemode == 1;
        let held = session.held_item().clone();

        let (tx, ty, tz) = offset_by_face(pkt.x, pkt.y as i32, pkt.z, pkt.direction);

        let placeable = !held.is_empty()
            && held.id > 0
            && (held.id as u16) <= 255
            && self
                .block_registry
                .get(held.id as u16)
                .map(|d| !d.is_air)
                .unwrap_or(false);

        let target_free = {
            let (id, _) = self.world.get_block(tx, ty, tz);
            id == 0 || id == 31 // air or tall grass
        };
        let in_range = (0..256).contains(&ty) && self.within_reach(conn, tx, ty, tz);
        let overlaps_player = {
            let (px, py, pz) = (session.x, session.y, session.z);
            let same_column =
                (px.floor() as i32) == tx && (pz.floor() as i32) == tz;
            same_column && ((py.floor() as i32) == ty || ((py + 1.0).floor() as i32) == ty)
        };

        if !placeable || !target_free || !in_range || overlaps_player {
            self.send_corrective_block(conn, tx, ty, tz).await;
            return;
        }

        let id = held.id as u16;
        let meta = (held.damage & 0xF) as u8;
        if !creative {
            if let Some(held) = self.session_mut(conn).map(|s| s.held_item_mut()) {
                held.count = held.count.saturating_sub(1);
                if held.count == 0 {
                    *held = Slot::EMPTY;
                }
            }
        }

        self.world.set_block(tx, ty, tz, id, meta);
        self.broadcast(
            cb::BLOCK_CHANGE,
            &BlockChange {
                x: tx,
                y: ty as u8,
                z: tz,
                block_id: id as i32,
                metadata: meta,
            },
        )
        .await;
        mechanics::on_block_changed(self, tx, ty, tz);
    }

    // --- abilities and inventory -----------------------------------------

    async fn handle_client_abilities(&mut self, conn: ConnectionId, pkt: PlayerAbilities) {
        let Some(session) = self.session_mut(conn) else {
            return;
        };
        let wants_flying = pkt.is_flying();
        if session.allow_flying {
            session.flying = wants_flying;
            return;
        }
        if wants_flying {
            // Not allowed: restate the authoritative abilities.
            let gamemode = session.gamemode;
            session.flying = false;
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
        }
    }

    fn handle_creative_slot(&mut self, conn: ConnectionId, pkt: CreativeInventoryAction) {
        let Some(session) = self.session_mut(conn) else {
            return;
        };
        if session.gamemode != 1 {
            return;
        }
        // Window slots 36-44 are the hotbar (.dat 0-8); 9-35 map directly.
        let index = match pkt.slot {
            36..=44 => (pkt.slot - 36) as usize,
            9..=35 => pkt.slot as usize,
            _ => return,
        };
        session.inventory[index] = pkt.item;
    }
}

/// Step one block along a dig/place face: -y +y -z +z -x +x.
fn offset_by_face(x: i32, y: i32, z: i32, face: i8) -> (i32, i32, i32) {
    match face {
        0 => (x, y - 1, z),
        1 => (x, y + 1, z),
        2 => (x, y, z - 1),
        3 => (x, y, z + 1),
        4 => (x - 1, y, z),
        _ => (x + 1, y, z),
    }
}
