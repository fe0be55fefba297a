//! Console and in-game commands.

use tracing::info;

use anvil_net::ConnectionId;
use anvil_proto::chat::ChatComponent;
use anvil_proto::packets::play::chat::ChatMessageCb;
use anvil_proto::packets::play::join::PlayerPosAndLook;
use anvil_proto::packets::play::world::TimeUpdate;
use anvil_proto::packets::play::cb;

use super::{join::EYE_HEIGHT, ConnectionHandler};

impl ConnectionHandler {
    /// Execute a console (or RCON-style) command line. Returns the text fed
    /// back to the operator.
    pub async fn handle_console_command(&mut self, line: &str) -> String {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return String::new();
        };
        let args: Vec<&str> = parts.collect();

        match command {
            "stop" => {
                info!("stop requested from console");
                self.request_shutdown();
                "Stopping the server".into()
            }
            "save-all" => {
                self.save_all();
                "Saved the world".into()
            }
            "list" => {
                let names = self.player_names();
                format!(
                    "There are {}/{} players online: {}",
                    names.len(),
                    self.config.server.max_players,
                    names.join(", ")
                )
            }
            "say" => {
                let message = args.join(" ");
                self.broadcast_chat(&ChatComponent::colored(
                    format!("[Server] {message}"),
                    "light_purple",
                ))
                .await;
                format!("[Server] {message}")
            }
            "time" => match args.as_slice() {
                ["set", value] => match value.parse::<i64>() {
                    Ok(time) => {
                        self.world.set_day_time(time);
                        self.broadcast(
                            cb::TIME_UPDATE,
                            &TimeUpdate {
                                world_age: self.world.total_time(),
                                time_of_day: self.world.time_of_day(),
                            },
                        )
                        .await;
                        format!("Set the time to {time}")
                    }
                    Err(_) => "Usage: time set <ticks>".into(),
                },
                ["query"] | [] => format!(
                    "Time is {} (day time {})",
                    self.world.total_time(),
                    self.world.time_of_day()
                ),
                _ => "Usage: time set <ticks> | time query".into(),
            },
            "kick" => {
                let Some(name) = args.first() else {
                    return "Usage: kick <player> [reason]".into();
                };
                let reason = if args.len() > 1 {
                    args[1..].join(" ")
                } else {
                    "Kicked by an operator".into()
                };
                match self.find_player(name) {
                    Some(conn) => {
                        self.kick(conn, &reason).await;
                        format!("Kicked {name}")
                    }
                    None => format!("Player {name} not found"),
                }
            }
            "tp" => {
                if args.len() != 4 {
                    return "Usage: tp <player> <x> <y> <z>".into();
                }
                let name = args[0];
                let parsed = (
                    args[1].parse::<f64>(),
                    args[2].parse::<f64>(),
                    args[3].parse::<f64>(),
                );
                let (Ok(x), Ok(y), Ok(z)) = parsed else {
                    return "Usage: tp <player> <x> <y> <z>".into();
                };
                match self.find_player(name) {
                    Some(conn) => {
                        self.teleport(conn, x, y, z).await;
                        format!("Teleported {name} to ({x}, {y}, {z})")
                    }
                    None => format!("Player {name} not found"),
                }
            }
            other => format!("Unknown command: {other}"),
        }
    }

    /// A chat line starting with `/`.
    pub(super) async fn handle_player_command(&mut self, conn: ConnectionId, command: &str) {
        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or("");
        let reply = match name {
            "list" => {
                let names = self.player_names();
                ChatComponent::text(format!(
                    "There are {}/{} players online: {}",
                    names.len(),
                    self.config.server.max_players,
                    names.join(", ")
                ))
            }
            "help" => ChatComponent::text("Available commands: /list, /help"),
            other => ChatComponent::colored(
                format!("Unknown command: /{other}. Try /help"),
                "red",
            ),
        };
        self.send(
            conn,
            cb::CHAT,
            &ChatMessageCb {
                json: reply.to_json(),
            },
        )
        .await;
    }

    fn find_player(&self, name: &str) -> Option<ConnectionId> {
        self.connections
            .values()
            .find(|c| {
                c.session
                    .as_ref()
                    .map(|s| s.name.eq_ignore_ascii_case(name))
                    .unwrap_or(false)
            })
            .map(|c| c.id)
    }

    async fn teleport(&mut self, conn: ConnectionId, x: f64, y: f64, z: f64) {
        let Some(session) = self
            .connections
            .get_mut(&conn)
            .and_then(|c| c.session.as_mut())
        else {
            return;
        };
        session.x = x;
        session.y = y;
        session.z = z;
        session.fall_distance = 0.0;
        session.last_sent_fixed = (
            anvil_proto::codec::to_fixed_point(x),
            anvil_proto::codec::to_fixed_point(y),
            anvil_proto::codec::to_fixed_point(z),
        );
        let (yaw, pitch, entity_id) = (session.yaw, session.pitch, session.entity_id);

        self.send(
            conn,
            cb::PLAYER_POS_AND_LOOK,
            &PlayerPosAndLook {
                x,
                y: y + EYE_HEIGHT,
                z,
                yaw,
                pitch,
                on_ground: false,
            },
        )
        .await;
        self.broadcast_except(
            conn,
            cb::ENTITY_TELEPORT,
            &anvil_proto::packets::play::entity::EntityTeleport {
                entity_id,
                x,
                y,
                z,
                yaw,
                pitch,
            },
        )
        .await;
        self.stream_chunks(conn).await;
    }
}
