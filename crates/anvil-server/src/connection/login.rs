//! Login phase: offline-mode identity assignment.

use bytes::Bytes;
use tracing::info;

use anvil_net::ConnectionId;
use anvil_proto::codec::ProtoDecode;
use anvil_proto::error::ProtocolError;
use anvil_proto::identity::offline_uuid;
use anvil_proto::packets::login::{
    LoginStart, LoginSuccess, ENCRYPTION_RESPONSE, LOGIN_START, LOGIN_SUCCESS,
};
use anvil_proto::Phase;

use super::{ConnectionHandler, PlayerSession};
use crate::persistence::PlayerData;

impl ConnectionHandler {
    pub(super) async fn handle_login(
        &mut self,
        conn: ConnectionId,
        packet_id: i32,
        buf: &mut Bytes,
    ) -> Result<(), ProtocolError> {
        match packet_id {
            LOGIN_START => {
                let start = LoginStart::proto_decode(buf)?;
                self.accept_login(conn, start.name).await;
                Ok(())
            }
            ENCRYPTION_RESPONSE => {
                // The offline path never requests encryption.
                Err(ProtocolError::malformed(
                    "unexpected encryption response in offline mode",
                ))
            }
            other => Err(ProtocolError::UnknownPacketId {
                phase: "login",
                id: other,
            }),
        }
    }

    async fn accept_login(&mut self, conn: ConnectionId, name: String) {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.kick(conn, "Invalid username").await;
            return;
        }
        if self.online_count() >= self.config.server.max_players as usize {
            self.kick(conn, "The server is full!").await;
            return;
        }
        if self
            .connections
            .values()
            .filter_map(|c| c.session.as_ref())
            .any(|s| s.name == name)
        {
            self.kick(conn, "You are logged in from another location!")
                .await;
            return;
        }

        let uuid = offline_uuid(&name);
        self.send(
            conn,
            LOGIN_SUCCESS,
            &LoginSuccess {
                uuid: uuid.to_string(),
                name: name.clone(),
            },
        )
        .await;

        let addr = self.connections.get(&conn).map(|c| c.addr);
        info!(player = %name, %uuid, addr = ?addr, "logged in (offline mode)");

        let entity_id = self.next_entity_id();
        let mut session = PlayerSession::new(entity_id, name, uuid, self.tick);

        // Spawn defaults, then whatever the player file remembers.
        let (sx, sy, sz) = self.world.spawn();
        session.x = sx as f64 + 0.5;
        session.y = sy as f64;
        session.z = sz as f64 + 0.5;
        session.gamemode = self.config.gamemode_numeric();
        session.allow_flying = session.gamemode == 1;
        if let Some(data) = PlayerData::load(self.world_dir(), &uuid) {
            data.apply_to_session(&mut session);
        }

        if let Some(client) = self.connections.get_mut(&conn) {
            client.phase = Phase::Play;
            client.login_deadline = None;
            client.session = Some(session);
        }

        self.send_join_sequence(conn).await;
    }
}
