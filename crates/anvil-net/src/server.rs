//! TCP acceptor and connection registry.
//!
//! The server task accepts sockets, spawns one task per connection, and
//! routes send/disconnect commands from the consumer to the right
//! connection. Inbound frames and lifecycle changes flow to the consumer
//! over a single event channel.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::connection::{run_connection, WriterMsg};
use crate::error::NetError;

/// Stable identifier for one accepted socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

/// Events emitted to the consumer.
#[derive(Debug)]
pub enum NetEvent {
    /// A socket was accepted.
    Connected { conn: ConnectionId, addr: SocketAddr },
    /// One complete frame payload (length prefix stripped).
    Frame { conn: ConnectionId, payload: Bytes },
    /// The connection is gone; no further events for this id.
    Closed { conn: ConnectionId, reason: String },
}

/// Commands from the consumer to the server task.
#[derive(Debug)]
enum NetCommand {
    Send { conn: ConnectionId, frame: Bytes },
    Disconnect { conn: ConnectionId },
}

/// Cloneable handle for sending commands from any task.
#[derive(Clone)]
pub struct ServerHandle {
    command_tx: mpsc::Sender<NetCommand>,
}

impl ServerHandle {
    /// Queue a pre-framed packet for a connection.
    pub async fn send(&self, conn: ConnectionId, frame: Bytes) {
        let _ = self.command_tx.send(NetCommand::Send { conn, frame }).await;
    }

    /// Close a connection after flushing its queue.
    pub async fn disconnect(&self, conn: ConnectionId) {
        let _ = self
            .command_tx
            .send(NetCommand::Disconnect { conn })
            .await;
    }
}

/// Outbound queue depth per connection before the peer counts as stalled.
const OUTBOUND_QUEUE: usize = 256;

pub struct NetServer {
    listener: TcpListener,
    sessions: HashMap<ConnectionId, mpsc::Sender<WriterMsg>>,
    next_id: u64,
    event_tx: mpsc::Sender<NetEvent>,
    command_rx: mpsc::Receiver<NetCommand>,
    done_tx: mpsc::Sender<ConnectionId>,
    done_rx: mpsc::Receiver<ConnectionId>,
}

impl NetServer {
    /// Bind the listener. Returns the server, the consumer's event
    /// receiver, and a command handle.
    pub async fn bind(
        addr: SocketAddr,
    ) -> Result<(Self, mpsc::Receiver<NetEvent>, ServerHandle), NetError> {
        let listener = TcpListener::bind(addr).await?;
        let (event_tx, event_rx) = mpsc::channel(1024);
        let (command_tx, command_rx) = mpsc::channel(1024);
        let (done_tx, done_rx) = mpsc::channel(256);

        info!("listening on {}", listener.local_addr()?);

        Ok((
            Self {
                listener,
                sessions: HashMap::new(),
                next_id: 1,
                event_tx,
                command_rx,
                done_tx,
                done_rx,
            },
            event_rx,
            ServerHandle { command_tx },
        ))
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept/route loop; returns when the shutdown signal flips.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.accept(stream, addr).await,
                        Err(e) => warn!("accept error: {e}"),
                    }
                }
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd).await;
                }
                Some(id) = self.done_rx.recv() => {
                    self.sessions.remove(&id);
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("network shutting down");
                        for (_, out_tx) in self.sessions.drain() {
                            let _ = out_tx.try_send(WriterMsg::Shutdown);
                        }
                        break;
                    }
                }
            }
        }
    }

    async fn accept(&mut self, stream: tokio::net::TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay failed for {addr}: {e}");
        }
        let id = ConnectionId(self.next_id);
        self.next_id += 1;

        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_QUEUE);
        self.sessions.insert(id, out_tx);

        debug!(conn = id.0, %addr, "accepted");
        let _ = self
            .event_tx
            .send(NetEvent::Connected { conn: id, addr })
            .await;

        tokio::spawn(run_connection(
            id,
            addr,
            stream,
            out_rx,
            self.event_tx.clone(),
            self.done_tx.clone(),
        ));
    }

    async fn handle_command(&mut self, cmd: NetCommand) {
        match cmd {
            NetCommand::Send { conn, frame } => {
                let Some(out_tx) = self.sessions.get(&conn) else {
                    return; // already gone; queued packets are dropped
                };
                // A full queue means the peer stopped draining; cut it off
                // rather than blocking every other connection.
                if out_tx.try_send(WriterMsg::Frame(frame)).is_err() {
                    warn!(conn = conn.0, "outbound queue overflow, disconnecting");
                    let _ = out_tx.try_send(WriterMsg::Shutdown);
                    self.sessions.remove(&conn);
                }
            }
            NetCommand::Disconnect { conn } => {
                if let Some(out_tx) = self.sessions.remove(&conn) {
                    let _ = out_tx.send(WriterMsg::Shutdown).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn start() -> (mpsc::Receiver<NetEvent>, ServerHandle, SocketAddr, watch::Sender<bool>) {
        let (mut server, events, handle) =
            NetServer::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move { server.run(shutdown_rx).await });
        (events, handle, addr, shutdown_tx)
    }

    #[tokio::test]
    async fn frames_flow_both_ways() {
        let (mut events, handle, addr, _shutdown) = start().await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        let conn = match events.recv().await.unwrap() {
            NetEvent::Connected { conn, .. } => conn,
            other => panic!("expected Connected, got {other:?}"),
        };

        // Client sends a 3-byte frame.
        client.write_all(&[0x03, 0x00, 0x01, 0x02]).await.unwrap();
        match events.recv().await.unwrap() {
            NetEvent::Frame { conn: c, payload } => {
                assert_eq!(c, conn);
                assert_eq!(&payload[..], &[0x00, 0x01, 0x02]);
            }
            other => panic!("expected Frame, got {other:?}"),
        }

        // Server sends a framed packet back.
        handle
            .send(conn, Bytes::from_static(&[0x02, 0x00, 0x2A]))
            .await;
        let mut out = [0u8; 3];
        client.read_exact(&mut out).await.unwrap();
        assert_eq!(out, [0x02, 0x00, 0x2A]);
    }

    #[tokio::test]
    async fn split_frame_reassembles() {
        let (mut events, _handle, addr, _shutdown) = start().await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        let _ = events.recv().await.unwrap(); // Connected

        client.write_all(&[0x04, 0xAA]).await.unwrap();
        client.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        client.write_all(&[0xBB, 0xCC, 0xDD]).await.unwrap();

        match events.recv().await.unwrap() {
            NetEvent::Frame { payload, .. } => {
                assert_eq!(&payload[..], &[0xAA, 0xBB, 0xCC, 0xDD]);
            }
            other => panic!("expected Frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversize_frame_closes_connection() {
        let (mut events, _handle, addr, _shutdown) = start().await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        let _ = events.recv().await.unwrap(); // Connected

        // VarInt(3 MiB) length prefix.
        let mut prefix = Vec::new();
        anvil_proto::VarInt(3 * 1024 * 1024).encode(&mut prefix);
        client.write_all(&prefix).await.unwrap();

        match events.recv().await.unwrap() {
            NetEvent::Closed { reason, .. } => {
                assert!(reason.contains("2 MiB"), "reason was {reason}");
            }
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn client_eof_reports_closed() {
        let (mut events, _handle, addr, _shutdown) = start().await;
        let client = TcpStream::connect(addr).await.unwrap();
        let _ = events.recv().await.unwrap();
        drop(client);
        match events.recv().await.unwrap() {
            NetEvent::Closed { .. } => {}
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn disconnect_flushes_queued_frames() {
        let (mut events, handle, addr, _shutdown) = start().await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        let conn = match events.recv().await.unwrap() {
            NetEvent::Connected { conn, .. } => conn,
            other => panic!("{other:?}"),
        };

        handle.send(conn, Bytes::from_static(&[0x01, 0x7F])).await;
        handle.disconnect(conn).await;

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, vec![0x01, 0x7F]);
    }
}
