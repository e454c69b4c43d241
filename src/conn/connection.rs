//! One framed packet stream.
//!
//! A [`Connection`] owns the write half of a framed stream; the read half
//! runs in a background task that forwards every inbound packet and error to
//! the owner's event channel. The stream type is erased at construction so
//! sessions handle TCP sockets and in-memory pipes alike.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::sink::Sink;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, Mutex};
use tokio_util::codec::Framed;
use tracing::{debug, trace};

use crate::error::{DomainError, Error, Result};
use crate::opcode::Opcode;
use crate::protocol::{Packet, PacketCodec, PayloadCodec, PayloadData, CTYPE_COMMAND};
use crate::types::{ConnectionId, DeviceId, PacketSequence, UserId};

/// Inbound notification from a connection's read task.
#[derive(Debug)]
pub enum ConnectionEvent {
    Packet {
        connection_id: ConnectionId,
        packet: Packet,
    },
    Error {
        connection_id: ConnectionId,
        error: Error,
    },
    Closed {
        connection_id: ConnectionId,
    },
}

type BoxedSink = Box<dyn Sink<Packet, Error = Error> + Send + Unpin>;

pub struct Connection {
    id: ConnectionId,
    open: AtomicBool,
    sink: Mutex<BoxedSink>,
}

impl Connection {
    /// Frame a raw stream and start its read task.
    pub fn spawn<S>(stream: S, events: mpsc::Sender<ConnectionEvent>) -> Arc<Self>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        Self::spawn_framed(Framed::new(stream, PacketCodec), events)
    }

    /// Start the read task for an already-framed stream. Used when the
    /// accept path has consumed packets before handing the stream over.
    pub fn spawn_framed<S>(
        framed: Framed<S, PacketCodec>,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Arc<Self>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (sink, mut stream) = framed.split();
        let conn = Arc::new(Self {
            id: ConnectionId::next(),
            open: AtomicBool::new(true),
            sink: Mutex::new(Box::new(sink) as BoxedSink),
        });

        let reader = Arc::clone(&conn);
        tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(packet) => {
                        trace!(connection = %reader.id, %packet, "received packet");
                        let event = ConnectionEvent::Packet {
                            connection_id: reader.id,
                            packet,
                        };
                        if events.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        let terminal = error.closes_connection();
                        debug!(connection = %reader.id, %error, terminal, "stream error");
                        let event = ConnectionEvent::Error {
                            connection_id: reader.id,
                            error,
                        };
                        if events.send(event).await.is_err() || terminal {
                            break;
                        }
                    }
                }
            }
            reader.open.store(false, Ordering::Release);
            let _ = events
                .send(ConnectionEvent::Closed {
                    connection_id: reader.id,
                })
                .await;
        });

        conn
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Send a fresh request and return its sequence for reply correlation.
    ///
    /// Server-origin headers are crossed: the device id slot carries the
    /// user id and vice versa. Devices only accept traffic shaped this way.
    pub async fn send(
        &self,
        opcode: Opcode,
        device_id: DeviceId,
        user_id: UserId,
        data: &PayloadData,
    ) -> Result<PacketSequence> {
        let packet = Packet {
            ctype: CTYPE_COMMAND,
            flow: 0,
            device_id: DeviceId(user_id.0),
            user_id: UserId(device_id.0),
            sequence: PacketSequence::generate(),
            opcode,
            payload: PayloadCodec::encode(opcode, data)?,
        };
        let sequence = packet.sequence;
        self.write(packet).await?;
        Ok(sequence)
    }

    /// Send the reply to an inbound request: sequence kept, flow bumped,
    /// header ids swapped back the same way [`Self::send`] crosses them.
    pub async fn respond(
        &self,
        request: &Packet,
        opcode: Opcode,
        data: &PayloadData,
    ) -> Result<()> {
        let payload = PayloadCodec::encode(opcode, data)?;
        self.write(Packet::respond_to(request, opcode, payload)).await
    }

    async fn write(&self, packet: Packet) -> Result<()> {
        if !self.is_open() {
            return Err(DomainError::ConnectionNotOpen.into());
        }
        trace!(connection = %self.id, %packet, "sending packet");
        let mut sink = self.sink.lock().await;
        sink.send(packet).await
    }

    /// Flush and close the write half. The read task winds down on its own
    /// when the peer acknowledges the shutdown.
    pub async fn close(&self) {
        self.open.store(false, Ordering::Release);
        let mut sink = self.sink.lock().await;
        let _ = sink.close().await;
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};
    use tokio_util::codec::Decoder;

    const GETTIME_FRAME: &str =
        "2500000002010100000002000000128c97bb0f9a477a121008001a090893afeefd0510901c";

    #[tokio::test]
    async fn test_inbound_packet_becomes_event() {
        let (local, mut remote) = duplex(4096);
        let (tx, mut rx) = mpsc::channel(8);
        let conn = Connection::spawn(local, tx);

        remote
            .write_all(&hex::decode(GETTIME_FRAME).unwrap())
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            ConnectionEvent::Packet {
                connection_id,
                packet,
            } => {
                assert_eq!(connection_id, conn.id());
                assert_eq!(packet.opcode.name(), "DEVICE_GETTIME_RSP");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_crosses_header_ids() {
        let (local, mut remote) = duplex(4096);
        let (tx, _rx) = mpsc::channel(8);
        let conn = Connection::spawn(local, tx);

        let opcode = Opcode::from_name("DEVICE_GETTIME_REQ").unwrap();
        conn.send(opcode, DeviceId(7), UserId(42), &PayloadData::Empty)
            .await
            .unwrap();

        let mut raw = vec![0u8; 24];
        remote.read_exact(&mut raw).await.unwrap();
        let mut frame = BytesMut::from(&raw[..]);
        let packet = PacketCodec.decode(&mut frame).unwrap().unwrap();

        assert_eq!(packet.device_id, DeviceId(42));
        assert_eq!(packet.user_id, UserId(7));
        assert_eq!(packet.opcode, opcode);
        assert_eq!(packet.flow, 0);
    }

    #[tokio::test]
    async fn test_undecodable_frame_closes_connection() {
        let (local, mut remote) = duplex(4096);
        let (tx, mut rx) = mpsc::channel(8);
        let conn = Connection::spawn(local, tx);

        // Well-formed header carrying an opcode outside the registry.
        let mut raw = Vec::new();
        raw.extend_from_slice(&24u32.to_le_bytes());
        raw.push(CTYPE_COMMAND);
        raw.push(0);
        raw.extend_from_slice(&1u32.to_le_bytes());
        raw.extend_from_slice(&2u32.to_le_bytes());
        raw.extend_from_slice(&0u64.to_le_bytes());
        raw.extend_from_slice(&0x7fffu16.to_le_bytes());
        remote.write_all(&raw).await.unwrap();

        match rx.recv().await.unwrap() {
            ConnectionEvent::Error { error, .. } => {
                assert!(error.closes_connection());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.recv().await.unwrap() {
            ConnectionEvent::Closed { connection_id } => {
                assert_eq!(connection_id, conn.id());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(!conn.is_open());
    }

    #[tokio::test]
    async fn test_peer_close_emits_closed_event() {
        let (local, remote) = duplex(4096);
        let (tx, mut rx) = mpsc::channel(8);
        let conn = Connection::spawn(local, tx);

        drop(remote);
        match rx.recv().await.unwrap() {
            ConnectionEvent::Closed { connection_id } => {
                assert_eq!(connection_id, conn.id());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(!conn.is_open());
    }

    #[tokio::test]
    async fn test_send_on_closed_connection_fails() {
        let (local, _remote) = duplex(4096);
        let (tx, _rx) = mpsc::channel(8);
        let conn = Connection::spawn(local, tx);
        conn.close().await;

        let opcode = Opcode::from_name("DEVICE_GETTIME_REQ").unwrap();
        let err = conn
            .send(opcode, DeviceId(1), UserId(1), &PayloadData::Empty)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Domain(DomainError::ConnectionNotOpen)));
    }
}
