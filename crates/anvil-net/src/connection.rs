//! One task per connection, multiplexing socket reads and the outbound
//! queue.
//!
//! Within a connection only this task reads and only this task writes, so
//! frames go out whole and in enqueue order. Closing drops the queue and
//! aborts in-flight work.

use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::frame::extract_frame;
use crate::server::{ConnectionId, NetEvent};

/// Messages to a connection's writer side.
#[derive(Debug)]
pub(crate) enum WriterMsg {
    /// A fully framed packet (length prefix included).
    Frame(Bytes),
    /// Flush and close.
    Shutdown,
}

const READ_CHUNK: usize = 8192;

pub(crate) async fn run_connection(
    id: ConnectionId,
    addr: SocketAddr,
    stream: TcpStream,
    mut out_rx: mpsc::Receiver<WriterMsg>,
    event_tx: mpsc::Sender<NetEvent>,
    done_tx: mpsc::Sender<ConnectionId>,
) {
    let (mut read_half, mut write_half) = stream.into_split();
    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    let mut reason = String::from("connection closed");

    'conn: loop {
        tokio::select! {
            result = read_half.read_buf(&mut buf) => {
                match result {
                    Ok(0) => {
                        reason = "end of stream".into();
                        break 'conn;
                    }
                    Ok(_) => loop {
                        match extract_frame(&mut buf) {
                            Ok(Some(payload)) => {
                                trace!(conn = id.0, len = payload.len(), "frame in");
                                if event_tx
                                    .send(NetEvent::Frame { conn: id, payload })
                                    .await
                                    .is_err()
                                {
                                    break 'conn;
                                }
                            }
                            Ok(None) => break,
                            Err(e) => {
                                reason = e.to_string();
                                break 'conn;
                            }
                        }
                    },
                    Err(e) => {
                        reason = format!("read error: {e}");
                        break 'conn;
                    }
                }
            }
            msg = out_rx.recv() => {
                match msg {
                    Some(WriterMsg::Frame(frame)) => {
                        // write_all loops on short writes; the frame goes
                        // out whole before the next message is taken.
                        if let Err(e) = write_half.write_all(&frame).await {
                            reason = format!("write error: {e}");
                            break 'conn;
                        }
                    }
                    Some(WriterMsg::Shutdown) => {
                        // Drain anything enqueued before the shutdown.
                        while let Ok(WriterMsg::Frame(frame)) = out_rx.try_recv() {
                            if write_half.write_all(&frame).await.is_err() {
                                break;
                            }
                        }
                        let _ = write_half.shutdown().await;
                        reason = "disconnected by server".into();
                        break 'conn;
                    }
                    None => {
                        reason = "server shutdown".into();
                        break 'conn;
                    }
                }
            }
        }
    }

    debug!(conn = id.0, %addr, %reason, "connection finished");
    let _ = done_tx.send(id).await;
    let _ = event_tx
        .send(NetEvent::Closed {
            conn: id,
            reason,
        })
        .await;
}
