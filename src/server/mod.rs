//! TCP front end.
//!
//! Three listeners, as the devices expect: the command port and the map port
//! both feed device sessions, the time port answers a single clock request
//! per connection. The first packet of every command/map connection is read
//! inline to learn which device is calling before the stream is handed to
//! its session.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::config::{Config, SessionConfig};
use crate::error::Result;
use crate::opcode::Opcode;
use crate::protocol::schema::{
    DeviceRegisterRsp, DeviceTimeBody, DeviceTimeRsp, ErrorReply, Message,
};
use crate::protocol::{Packet, PacketCodec, Payload, PayloadCodec, PayloadData};
use crate::session::{validate_handlers, Session};
use crate::types::{DeviceId, UserId};

const RESULT_NOT_REGISTERED: u32 = 2;

#[derive(Debug, Clone, Copy)]
enum ListenerKind {
    Cmd,
    Map,
    Time,
}

impl std::fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerKind::Cmd => write!(f, "cmd"),
            ListenerKind::Map => write!(f, "map"),
            ListenerKind::Time => write!(f, "time"),
        }
    }
}

struct Shared {
    session_config: SessionConfig,
    sessions: DashMap<DeviceId, Arc<Session>>,
    device_seq: AtomicU32,
    user_seq: AtomicU32,
    shutdown_tx: watch::Sender<bool>,
}

/// Cloneable control surface over a running server.
#[derive(Clone)]
pub struct ServerHandle {
    shared: Arc<Shared>,
}

impl ServerHandle {
    /// Ask the server to stop accepting and close every session.
    pub fn shutdown(&self) {
        let _ = self.shared.shutdown_tx.send(true);
    }

    pub fn session_count(&self) -> usize {
        self.shared.sessions.len()
    }

    pub fn session(&self, device_id: DeviceId) -> Option<Arc<Session>> {
        self.shared.sessions.get(&device_id).map(|s| s.clone())
    }
}

pub struct PacketServer {
    shared: Arc<Shared>,
    cmd: TcpListener,
    map: TcpListener,
    time: TcpListener,
}

impl PacketServer {
    /// Bind all three listeners. Fails fast on a bad handler table or an
    /// unusable address.
    pub async fn bind(config: &Config) -> Result<Self> {
        validate_handlers()?;
        config.validate()?;

        let (shutdown_tx, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            session_config: config.session.clone(),
            sessions: DashMap::new(),
            device_seq: AtomicU32::new(1),
            user_seq: AtomicU32::new(1),
            shutdown_tx,
        });

        let cmd = TcpListener::bind(config.server.cmd_addr()).await?;
        let map = TcpListener::bind(config.server.map_addr()).await?;
        let time = TcpListener::bind(config.server.time_addr()).await?;
        info!(
            cmd = %cmd.local_addr()?,
            map = %map.local_addr()?,
            time = %time.local_addr()?,
            "listening"
        );

        Ok(Self {
            shared,
            cmd,
            map,
            time,
        })
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn cmd_addr(&self) -> Result<SocketAddr> {
        Ok(self.cmd.local_addr()?)
    }

    pub fn map_addr(&self) -> Result<SocketAddr> {
        Ok(self.map.local_addr()?)
    }

    pub fn time_addr(&self) -> Result<SocketAddr> {
        Ok(self.time.local_addr()?)
    }

    /// Serve until [`ServerHandle::shutdown`] is called, then close every
    /// session.
    pub async fn run(self) -> Result<()> {
        let Self {
            shared,
            cmd,
            map,
            time,
        } = self;

        tokio::spawn(accept_loop(Arc::clone(&shared), cmd, ListenerKind::Cmd));
        tokio::spawn(accept_loop(Arc::clone(&shared), map, ListenerKind::Map));
        tokio::spawn(accept_loop(Arc::clone(&shared), time, ListenerKind::Time));

        let mut shutdown_rx = shared.shutdown_tx.subscribe();
        while !*shutdown_rx.borrow() {
            if shutdown_rx.changed().await.is_err() {
                break;
            }
        }

        let sessions: Vec<Arc<Session>> =
            shared.sessions.iter().map(|e| e.value().clone()).collect();
        info!(sessions = sessions.len(), "shutting down");
        for session in sessions {
            session.close().await;
        }
        Ok(())
    }
}

async fn accept_loop(shared: Arc<Shared>, listener: TcpListener, kind: ListenerKind) {
    let mut shutdown_rx = shared.shutdown_tx.subscribe();
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%kind, %peer, "connection accepted");
                    let shared = Arc::clone(&shared);
                    tokio::spawn(async move {
                        match kind {
                            ListenerKind::Time => serve_time_stream(shared, stream).await,
                            ListenerKind::Cmd | ListenerKind::Map => {
                                serve_device_stream(shared, stream).await
                            }
                        }
                    });
                }
                Err(error) => {
                    warn!(%kind, %error, "accept failed");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            },
        }
    }
}

/// Command/map connections: read the first packet to learn the caller, then
/// hand the stream to the device's session.
async fn serve_device_stream(shared: Arc<Shared>, stream: TcpStream) {
    let mut framed = Framed::new(stream, PacketCodec);
    let first = match framed.next().await {
        Some(Ok(packet)) => packet,
        Some(Err(error)) => {
            warn!(%error, "first packet unreadable");
            return;
        }
        None => return,
    };

    if first.opcode.name() == "DEVICE_REGISTER_REQ" {
        if let Err(error) = register_device(&shared, &mut framed, &first).await {
            warn!(%error, "registration failed");
        }
        return;
    }

    if !first.device_id.is_registered() {
        warn!(%first, "unregistered device rejected");
        let _ = send_error_reply(&mut framed, &first, "device not registered").await;
        return;
    }

    let session = session_for(&shared, first.device_id, first.user_id);
    let connection = session.attach(framed);
    session.inject(connection.id(), first).await;
}

/// Hand out fresh device and user ids. The device closes the connection
/// after the reply and reconnects with its new identity.
async fn register_device(
    shared: &Arc<Shared>,
    framed: &mut Framed<TcpStream, PacketCodec>,
    request: &Packet,
) -> Result<()> {
    let payload = Payload::decode(request)?;
    if let PayloadData::Message(Message::DeviceRegisterReq(req)) = &payload.data {
        info!(
            serial = %req.device_serial_number,
            software = %req.software_version,
            "device registration"
        );
    }

    let device_id = shared.device_seq.fetch_add(1, Ordering::Relaxed);
    let user_id = shared.user_seq.fetch_add(1, Ordering::Relaxed);
    let opcode = Opcode::from_name("DEVICE_REGISTER_RSP")?;
    let data = PayloadData::Message(Message::DeviceRegisterRsp(DeviceRegisterRsp {
        result: 0,
        device_id,
        user_id,
    }));
    let reply = Packet::respond_to(request, opcode, PayloadCodec::encode(opcode, &data)?);
    info!(device = device_id, user = user_id, "identity assigned");
    framed.send(reply).await
}

async fn send_error_reply(
    framed: &mut Framed<TcpStream, PacketCodec>,
    request: &Packet,
    text: &str,
) -> Result<()> {
    let opcode = Opcode::from_name("COMMON_ERROR_REPLY")?;
    let data = PayloadData::Message(Message::ErrorReply(ErrorReply {
        result: RESULT_NOT_REGISTERED,
        error: text.to_string(),
        opcode: u32::from(request.opcode.code()),
    }));
    let reply = Packet::respond_to(request, opcode, PayloadCodec::encode(opcode, &data)?);
    framed.send(reply).await
}

fn session_for(shared: &Arc<Shared>, device_id: DeviceId, user_id: UserId) -> Arc<Session> {
    match shared.sessions.entry(device_id) {
        Entry::Occupied(entry) => Arc::clone(entry.get()),
        Entry::Vacant(entry) => {
            let (session, task) = Session::spawn(device_id, user_id, shared.session_config.clone());
            entry.insert(Arc::clone(&session));

            // Drop the registry entry when the session's last connection
            // goes away, unless a newer session took the slot.
            let shared = Arc::clone(shared);
            let registered = Arc::clone(&session);
            tokio::spawn(async move {
                let _ = task.await;
                shared
                    .sessions
                    .remove_if(&device_id, |_, current| Arc::ptr_eq(current, &registered));
            });
            session
        }
    }
}

/// The time port answers exactly one clock request and closes.
async fn serve_time_stream(shared: Arc<Shared>, stream: TcpStream) {
    let mut framed = Framed::new(stream, PacketCodec);
    let request = match framed.next().await {
        Some(Ok(packet)) => packet,
        _ => return,
    };
    if request.opcode.name() != "DEVICE_TIME_SYNC_REQ" {
        debug!(%request, "unexpected packet on time port");
        return;
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let result: Result<()> = async {
        let opcode = Opcode::from_name("DEVICE_TIME_SYNC_RSP")?;
        let data = PayloadData::Message(Message::DeviceTimeRsp(DeviceTimeRsp {
            result: 0,
            body: Some(DeviceTimeBody {
                device_time: now,
                device_timezone: shared.session_config.timezone_offset_secs,
            }),
        }));
        let reply = Packet::respond_to(&request, opcode, PayloadCodec::encode(opcode, &data)?);
        framed.send(reply).await?;
        framed.close().await
    }
    .await;
    if let Err(error) = result {
        warn!(%error, "time sync reply failed");
    }
}
