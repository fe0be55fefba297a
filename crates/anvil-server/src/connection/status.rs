//! Status phase: server-list query and latency ping.

use bytes::Bytes;

use anvil_net::ConnectionId;
use anvil_proto::codec::ProtoDecode;
use anvil_proto::error::ProtocolError;
use anvil_proto::packets::status::{Ping, StatusResponsePacket, PING, PONG, REQUEST, RESPONSE};
use anvil_proto::status::StatusResponse;

use super::ConnectionHandler;

impl ConnectionHandler {
    pub(super) async fn handle_status(
        &mut self,
        conn: ConnectionId,
        packet_id: i32,
        buf: &mut Bytes,
    ) -> Result<(), ProtocolError> {
        match packet_id {
            REQUEST => {
                let mut status = StatusResponse::new(
                    &self.config.server.motd,
                    self.online_count() as i32,
                    self.config.server.max_players as i32,
                );
                if let Some(icon) = self.favicon() {
                    status = status.with_favicon(icon);
                }
                self.send(
                    conn,
                    RESPONSE,
                    &StatusResponsePacket {
                        json: status.to_json(),
                    },
                )
                .await;
                Ok(())
            }
            PING => {
                let ping = Ping::proto_decode(buf)?;
                self.send(conn, PONG, &ping).await;
                // The exchange is over; the server closes even if the
                // client lingers.
                self.handle.disconnect(conn).await;
                Ok(())
            }
            other => Err(ProtocolError::UnknownPacketId {
                phase: "status",
                id: other,
            }),
        }
    }
}
