//! The per-tick simulation pass.
//!
//! Order per tick: world clock and queued unloads, scheduled block updates,
//! random block ticks, food and regeneration, broadcasts, keep-alive, login
//! timeouts, auto-save.

use rand::Rng;

use anvil_net::ConnectionId;
use anvil_proto::packets::play::session::UpdateHealth;
use anvil_proto::packets::play::world::{BlockChange, TimeUpdate};
use anvil_proto::packets::play::cb;
use anvil_proto::Phase;

use super::{mechanics, ConnectionHandler, KEEPALIVE_INTERVAL, KEEPALIVE_TIMEOUT};

/// Random tick attempts per eligible section per tick.
const RANDOM_TICKS_PER_SECTION: usize = 3;
/// Chunk radius around players that simulates random ticks.
const SIM_RADIUS: i32 = 4;

impl ConnectionHandler {
    /// One authoritative simulation step. All world mutation for the tick
    /// completes before this returns.
    pub async fn game_tick(&mut self) {
        self.tick += 1;
        self.world.tick(self.config.world.unload_budget);

        self.run_scheduled_ticks().await;
        self.run_random_ticks().await;
        self.tick_food().await;

        // Clock sync four times per day-second.
        if self.tick % 20 == 0 {
            self.broadcast(
                cb::TIME_UPDATE,
                &TimeUpdate {
                    world_age: self.world.total_time(),
                    time_of_day: self.world.time_of_day(),
                },
            )
            .await;
        }

        self.tick_keepalive().await;
        self.tick_login_timeouts().await;

        if self.auto_save_interval_ticks > 0 && self.tick % self.auto_save_interval_ticks == 0 {
            self.save_all();
        }
    }

    // --- block updates ----------------------------------------------------

    async fn run_scheduled_ticks(&mut self) {
        let ready = self.scheduler.drain_ready(self.world.total_time() as u64);
        for tick in ready {
            let outcome = mechanics::scheduled_tick(&self.world, &tick);
            for (x, y, z, id, meta) in outcome.changes {
                self.apply_block_change(x, y, z, id, meta).await;
            }
            if let Some((x, y, z, id)) = outcome.reschedule {
                self.scheduler.schedule(x, y, z, id, 2, self.world.total_time() as u64);
            }
        }
    }

    async fn run_random_ticks(&mut self) {
        // Columns in simulation range of at least one player.
        let mut sim_chunks = std::collections::HashSet::new();
        for client in self.connections.values() {
            let Some(session) = &client.session else { continue };
            let (pcx, pcz) = session.chunk_pos();
            for dz in -SIM_RADIUS..=SIM_RADIUS {
                for dx in -SIM_RADIUS..=SIM_RADIUS {
                    sim_chunks.insert((pcx + dx, pcz + dz));
                }
            }
        }

        let mut changes = Vec::new();
        for (cx, cz) in sim_chunks {
            // Section bases are read under the chunk lock; the RNG rolls
            // and block lookups happen after it is released.
            let bases: Option<Vec<i32>> = self.world.with_chunk(cx, cz, |chunk| {
                chunk
                    .sections
                    .iter()
                    .flatten()
                    .filter(|s| s.needs_random_tick())
                    .map(|s| s.y_index() as i32 * 16)
                    .collect()
            });
            let Some(bases) = bases else { continue };
            for base_y in bases {
                for _ in 0..RANDOM_TICKS_PER_SECTION {
                    let x = cx * 16 + self.rng.gen_range(0..16);
                    let y = base_y + self.rng.gen_range(0..16);
                    let z = cz * 16 + self.rng.gen_range(0..16);
                    let (id, _) = self.world.get_block(x, y, z);
                    if id == 0 {
                        continue;
                    }
                    if let Some((new_id, new_meta)) = mechanics::random_tick(
                        &self.world,
                        &self.block_registry,
                        &mut self.rng,
                        x,
                        y,
                        z,
                        id,
                    ) {
                        changes.push((x, y, z, new_id, new_meta));
                    }
                }
            }
        }
        for (x, y, z, id, meta) in changes {
            self.apply_block_change(x, y, z, id, meta).await;
        }
    }

    /// Mutate the world and tell everyone.
    pub(super) async fn apply_block_change(&mut self, x: i32, y: i32, z: i32, id: u16, meta: u8) {
        if !self.world.set_block(x, y, z, id, meta) {
            return;
        }
        self.broadcast(
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
        mechanics::on_block_changed(self, x, y, z);
    }

    // --- player upkeep ----------------------------------------------------

    async fn tick_food(&mut self) {
        let mut health_updates = Vec::new();
        for client in self.connections.values_mut() {
            let Some(session) = client.session.as_mut() else {
                continue;
            };
            if session.gamemode == 1 {
                continue; // creative neither starves nor regenerates
            }
            let mut changed = false;

            if session.exhaustion >= 4.0 {
                session.exhaustion -= 4.0;
                if session.saturation > 0.0 {
                    session.saturation = (session.saturation - 1.0).max(0.0);
                } else if session.food > 0 {
                    session.food -= 1;
                }
                changed = true;
            }

            if session.food >= 18 && session.health < 20.0 {
                session.food_timer += 1;
                if session.food_timer >= 80 {
                    session.food_timer = 0;
                    session.health = (session.health + 1.0).min(20.0);
                    session.exhaustion += 3.0;
                    changed = true;
                }
            } else if session.food == 0 {
                session.food_timer += 1;
                if session.food_timer >= 80 {
                    session.food_timer = 0;
                    if session.health > 1.0 {
                        session.health -= 1.0;
                        changed = true;
                    }
                }
            } else {
                session.food_timer = 0;
            }

            if changed {
                health_updates.push((
                    client.id,
                    UpdateHealth {
                        health: session.health,
                        food: session.food,
                        saturation: session.saturation,
                    },
                ));
            }
        }
        for (conn, update) in health_updates {
            self.send(conn, cb::UPDATE_HEALTH, &update).await;
        }
    }

    // --- liveness ---------------------------------------------------------

    async fn tick_keepalive(&mut self) {
        let now = self.tick;
        let mut to_send: Vec<(ConnectionId, i32)> = Vec::new();
        let mut to_timeout: Vec<ConnectionId> = Vec::new();

        let due: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.phase == Phase::Play)
            .filter_map(|c| {
                let session = c.session.as_ref()?;
                if session.keepalive_pending
                    && now.saturating_sub(session.keepalive_sent_tick) >= KEEPALIVE_TIMEOUT
                {
                    to_timeout.push(c.id);
                    None
                } else if !session.keepalive_pending
                    && now.saturating_sub(session.keepalive_sent_tick) >= KEEPALIVE_INTERVAL
                {
                    Some(c.id)
                } else {
                    None
                }
            })
            .collect();

        for conn in due {
            let id = self.next_keepalive_id();
            if let Some(session) = self
                .connections
                .get_mut(&conn)
                .and_then(|c| c.session.as_mut())
            {
                session.keepalive_id = id;
                session.keepalive_pending = true;
                session.keepalive_sent_tick = now;
            }
            to_send.push((conn, id));
        }
        for (conn, id) in to_send {
            self.send(
                conn,
                cb::KEEP_ALIVE,
                &anvil_proto::packets::play::keep_alive::KeepAlive { id },
            )
            .await;
        }
        for conn in to_timeout {
            tracing::info!(conn = conn.0, "keep-alive timeout");
            self.kick(conn, "Timed out").await;
            // Tear the session down now; nothing further may be enqueued
            // for this connection.
            self.finish_connection(conn, "keep-alive timeout").await;
        }
    }

    async fn tick_login_timeouts(&mut self) {
        let now = self.tick;
        let expired: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| {
                c.phase == Phase::Login
                    && c.login_deadline.map(|d| now >= d).unwrap_or(false)
            })
            .map(|c| c.id)
            .collect();
        for conn in expired {
            self.kick(conn, "Took too long to log in").await;
            self.connections.remove(&conn);
        }
    }
}
