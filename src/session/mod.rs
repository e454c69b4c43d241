//! Per-device session.
//!
//! A session owns every connection of one registered device and runs a
//! single task over their merged event stream, so all state mutation is
//! serialized without locking across handlers. Outbound request/reply
//! exchanges are correlated through a pending table keyed by the expected
//! reply opcode.

mod handlers;

pub use handlers::validate_handlers;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::conn::{Connection, ConnectionEvent, Multiplexer};
use crate::error::{DomainError, Error, Result};
use crate::opcode::Opcode;
use crate::protocol::schema::{
    DeviceStatusBody, DeviceTimeBody, ErrorReply, Message, PackageVersion, WlanInfoBody,
};
use crate::protocol::{Packet, PacketCodec, Payload, PayloadData};
use crate::types::{ConnectionId, DeviceId, UserId};

// Section mask requested from the device when fetching the full map during
// the handshake. Everything except the path history.
const HANDSHAKE_MAP_MASK: u32 = 0x78fb;

const RESULT_USER_OFFLINE: u32 = 1;

const RESULT_BAD_PAYLOAD: u32 = 3;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connections are arriving; the device has not been probed yet.
    Connecting,
    /// The startup exchange with the device is in flight.
    Handshaking,
    /// The device answered the startup exchange and accepts commands.
    Ready,
}

/// Latest knowledge about the device, projected from pushes and replies.
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    pub battery: Option<u32>,
    pub status: Option<DeviceStatusBody>,
    pub pose: Option<crate::binary::pose::DevicePose>,
    pub charger: Option<crate::binary::pose::ChargePose>,
    pub fault_code: Option<u32>,
    pub wlan: Option<WlanInfoBody>,
    pub device_time: Option<DeviceTimeBody>,
    pub versions: Vec<PackageVersion>,
    pub last_clean_task: Option<crate::protocol::schema::CleanTaskReport>,
}

pub struct Session {
    device_id: DeviceId,
    user_id: UserId,
    config: SessionConfig,
    state: Mutex<SessionState>,
    mux: Multiplexer,
    pending: Mutex<HashMap<&'static str, oneshot::Sender<Packet>>>,
    device: Mutex<DeviceState>,
    events_tx: mpsc::Sender<ConnectionEvent>,
}

impl Session {
    /// Create the session and start its event task. The handle resolves when
    /// the last connection is gone.
    pub fn spawn(
        device_id: DeviceId,
        user_id: UserId,
        config: SessionConfig,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let session = Arc::new(Self {
            device_id,
            user_id,
            config,
            state: Mutex::new(SessionState::Connecting),
            mux: Multiplexer::new(),
            pending: Mutex::new(HashMap::new()),
            device: Mutex::new(DeviceState::default()),
            events_tx,
        });
        let task = tokio::spawn(Arc::clone(&session).run(events_rx));
        (session, task)
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn connection_count(&self) -> usize {
        self.mux.len()
    }

    /// Snapshot of the projected device state.
    pub fn device_state(&self) -> DeviceState {
        self.device.lock().clone()
    }

    fn update_state(&self, f: impl FnOnce(&mut DeviceState)) {
        f(&mut self.device.lock());
    }

    /// Adopt a framed stream as one of this device's connections. The
    /// startup exchange fires once the second connection is up, since the
    /// device only answers commands after its map channel exists.
    pub fn attach<S>(self: &Arc<Self>, framed: Framed<S, PacketCodec>) -> Arc<Connection>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let connection = Connection::spawn_framed(framed, self.events_tx.clone());
        info!(device = %self.device_id, connection = %connection.id(), "connection attached");
        self.mux.add(Arc::clone(&connection));

        let should_handshake = {
            let mut state = self.state.lock();
            if self.mux.len() >= 2 && *state == SessionState::Connecting {
                *state = SessionState::Handshaking;
                true
            } else {
                false
            }
        };
        if should_handshake {
            tokio::spawn(Arc::clone(self).run_handshake());
        }
        connection
    }

    /// Feed a packet the accept path already read off the stream into the
    /// session's event loop.
    pub async fn inject(&self, connection_id: ConnectionId, packet: Packet) {
        let _ = self
            .events_tx
            .send(ConnectionEvent::Packet {
                connection_id,
                packet,
            })
            .await;
    }

    /// Fire-and-forget request to the device.
    pub async fn send(&self, opcode: Opcode, data: &PayloadData) -> Result<()> {
        self.mux
            .send(opcode, self.device_id, self.user_id, data)
            .await?;
        Ok(())
    }

    /// Wait for a device packet matched by opcode name within the configured
    /// timeout, without sending anything first. Used when the packet is
    /// expected as a consequence of earlier traffic.
    pub async fn recv(&self, opcode_name: &str) -> Result<Packet> {
        let opcode = Opcode::from_name(opcode_name)?;
        let rx = self.register_pending(opcode.name());
        self.await_pending(opcode.name(), rx).await
    }

    /// Request/reply exchange. The waiter is registered before the request
    /// goes out so the reply cannot race past it.
    pub async fn send_recv(
        &self,
        opcode: Opcode,
        data: &PayloadData,
        reply: &str,
    ) -> Result<Packet> {
        let reply_opcode = Opcode::from_name(reply)?;
        let rx = self.register_pending(reply_opcode.name());

        if let Err(error) = self
            .mux
            .send(opcode, self.device_id, self.user_id, data)
            .await
        {
            self.pending.lock().remove(reply_opcode.name());
            return Err(error);
        }

        self.await_pending(reply_opcode.name(), rx).await
    }

    fn register_pending(&self, name: &'static str) -> oneshot::Receiver<Packet> {
        let (tx, rx) = oneshot::channel();
        // Re-registering drops any stale sender for the same reply.
        self.pending.lock().insert(name, tx);
        rx
    }

    /// The stale pending entry is cleared on timeout so a late packet cannot
    /// satisfy a future exchange.
    async fn await_pending(
        &self,
        name: &'static str,
        rx: oneshot::Receiver<Packet>,
    ) -> Result<Packet> {
        match tokio::time::timeout(self.config.recv_timeout, rx).await {
            Ok(Ok(packet)) => Ok(packet),
            Ok(Err(_)) | Err(_) => {
                self.pending.lock().remove(name);
                Err(DomainError::RecvTimeout { opcode: name }.into())
            }
        }
    }

    /// Close every connection. The session task ends once their read tasks
    /// report closure.
    pub async fn close(&self) {
        self.mux.close_all().await;
    }

    async fn run(self: Arc<Self>, mut events: mpsc::Receiver<ConnectionEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                ConnectionEvent::Packet {
                    connection_id,
                    packet,
                } => {
                    self.handle_packet(connection_id, packet).await;
                }
                ConnectionEvent::Error {
                    connection_id,
                    error,
                } => {
                    warn!(device = %self.device_id, connection = %connection_id, %error, "connection error");
                }
                ConnectionEvent::Closed { connection_id } => {
                    self.mux.remove(connection_id);
                    debug!(device = %self.device_id, connection = %connection_id, remaining = self.mux.len(), "connection closed");
                    if self.mux.is_empty() {
                        break;
                    }
                }
            }
        }
        // Wake any exchange still parked on the pending table.
        self.pending.lock().clear();
        info!(device = %self.device_id, "session ended");
    }

    async fn handle_packet(&self, connection_id: ConnectionId, packet: Packet) {
        // Replies to our own requests carry a bumped flow; match them
        // against the pending table first.
        if packet.flow > 0 {
            if let Some(tx) = self.pending.lock().remove(packet.opcode.name()) {
                let _ = tx.send(packet);
                return;
            }
        } else if !self.user_gate(&packet) {
            self.reject_foreign_user(connection_id, &packet).await;
            return;
        }

        let payload = match Payload::decode(&packet) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(device = %self.device_id, %packet, %error, "undecodable payload");
                if packet.flow == 0 {
                    self.reject_undecodable(connection_id, &packet, &error).await;
                }
                return;
            }
        };

        let handler = match handlers::lookup(packet.opcode.name()) {
            Some(handler) => handler,
            None => {
                debug!(device = %self.device_id, opcode = %packet.opcode, "unhandled opcode");
                return;
            }
        };

        match handler(self, &payload) {
            Ok(Some(reply)) => {
                let data = reply.data;
                if let Err(error) = self
                    .mux
                    .respond(connection_id, &packet, reply.opcode, &data)
                    .await
                {
                    warn!(device = %self.device_id, opcode = %reply.opcode, %error, "reply failed");
                }
            }
            Ok(None) => {}
            Err(error) => {
                warn!(device = %self.device_id, opcode = %packet.opcode, %error, "handler failed");
            }
        }
    }

    /// Device-initiated packets must carry the paired user id. Zero is the
    /// broadcast user and always passes.
    fn user_gate(&self, packet: &Packet) -> bool {
        !packet.user_id.is_set() || packet.user_id == self.user_id
    }

    async fn reject_foreign_user(&self, connection_id: ConnectionId, packet: &Packet) {
        warn!(
            device = %self.device_id,
            got = %packet.user_id,
            expected = %self.user_id,
            "packet for foreign user rejected"
        );
        let opcode = match Opcode::from_name("COMMON_ERROR_REPLY") {
            Ok(opcode) => opcode,
            Err(_) => return,
        };
        let data = PayloadData::Message(Message::ErrorReply(ErrorReply {
            result: RESULT_USER_OFFLINE,
            error: "target user offline".to_string(),
            opcode: u32::from(packet.opcode.code()),
        }));
        if let Err(error) = self.mux.respond(connection_id, packet, opcode, &data).await {
            warn!(device = %self.device_id, %error, "error reply failed");
        }
    }

    /// Report a payload the codec could not decode back to the requester.
    async fn reject_undecodable(
        &self,
        connection_id: ConnectionId,
        packet: &Packet,
        error: &Error,
    ) {
        let opcode = match Opcode::from_name("COMMON_ERROR_REPLY") {
            Ok(opcode) => opcode,
            Err(_) => return,
        };
        let data = PayloadData::Message(Message::ErrorReply(ErrorReply {
            result: RESULT_BAD_PAYLOAD,
            error: error.to_string(),
            opcode: u32::from(packet.opcode.code()),
        }));
        if let Err(send_error) = self.mux.respond(connection_id, packet, opcode, &data).await {
            warn!(device = %self.device_id, %send_error, "error reply failed");
        }
    }

    /// Startup exchange: take the control lock, kick off the status and map
    /// snapshots, then read the device clock and WLAN details.
    async fn run_handshake(self: Arc<Self>) {
        info!(device = %self.device_id, "handshake started");
        match self.handshake_exchanges().await {
            Ok(()) => {
                *self.state.lock() = SessionState::Ready;
                info!(device = %self.device_id, "handshake complete");
            }
            Err(error) => {
                warn!(device = %self.device_id, %error, "handshake aborted");
                *self.state.lock() = SessionState::Connecting;
            }
        }
    }

    /// The control lock is mandatory; the remaining steps only warm the
    /// device state and are tolerated to fail.
    async fn handshake_exchanges(&self) -> Result<()> {
        self.send_recv(
            Opcode::from_name("DEVICE_CONTROL_LOCK_REQ")?,
            &PayloadData::Empty,
            "DEVICE_CONTROL_LOCK_RSP",
        )
        .await?;

        // Snapshots come back as ordinary pushes; no need to wait for them.
        let status = self
            .send(
                Opcode::from_name("DEVICE_STATUS_GETTING_REQ")?,
                &PayloadData::Empty,
            )
            .await;
        if let Err(error) = status {
            warn!(device = %self.device_id, %error, "status snapshot request failed");
        }
        let map = self
            .send(
                Opcode::from_name("DEVICE_MAPID_GET_GLOBAL_INFO_REQ")?,
                &PayloadData::Message(Message::SetValueReq(
                    crate::protocol::schema::SetValueReq {
                        value: HANDSHAKE_MAP_MASK,
                    },
                )),
            )
            .await;
        if let Err(error) = map {
            warn!(device = %self.device_id, %error, "map snapshot request failed");
        }

        match self
            .send_recv(
                Opcode::from_name("DEVICE_GETTIME_REQ")?,
                &PayloadData::Empty,
                "DEVICE_GETTIME_RSP",
            )
            .await
            .and_then(|packet| Payload::decode(&packet))
        {
            Ok(payload) => {
                if let PayloadData::Message(Message::DeviceTimeRsp(rsp)) = payload.data {
                    self.update_state(|s| s.device_time = rsp.body);
                }
            }
            Err(error) => {
                warn!(device = %self.device_id, %error, "device clock not read");
            }
        }

        match self
            .send_recv(
                Opcode::from_name("DEVICE_WLAN_INFO_GETTING_REQ")?,
                &PayloadData::Empty,
                "DEVICE_WLAN_INFO_GETTING_RSP",
            )
            .await
            .and_then(|packet| Payload::decode(&packet))
        {
            Ok(payload) => {
                if let PayloadData::Message(Message::DeviceWlanInfoRsp(rsp)) = payload.data {
                    self.update_state(|s| s.wlan = rsp.body);
                }
            }
            Err(error) => {
                warn!(device = %self.device_id, %error, "wlan info not read");
            }
        }

        Ok(())
    }

    fn reply_payload(opcode_name: &'static str, message: Message) -> Result<Option<Payload>> {
        Ok(Some(Payload::new(
            Opcode::from_name(opcode_name)?,
            PayloadData::Message(message),
        )))
    }

    fn empty_reply(opcode_name: &'static str) -> Result<Option<Payload>> {
        Ok(Some(Payload::new(
            Opcode::from_name(opcode_name)?,
            PayloadData::Empty,
        )))
    }
}
