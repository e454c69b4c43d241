//! Connection set of one device session.
//!
//! Devices open several sockets to the server (command, map, heartbeat).
//! The multiplexer keeps them in arrival order: new requests go out on the
//! oldest connection, replies go out on the connection their request came
//! in on.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::Connection;
use crate::error::{DomainError, Result};
use crate::opcode::Opcode;
use crate::protocol::{Packet, PayloadData};
use crate::types::{ConnectionId, DeviceId, PacketSequence, UserId};

#[derive(Debug, Default)]
pub struct Multiplexer {
    connections: Mutex<Vec<Arc<Connection>>>,
}

impl Multiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a connection. Idempotent; returns false when the id is already
    /// present.
    pub fn add(&self, connection: Arc<Connection>) -> bool {
        let mut connections = self.connections.lock();
        if connections.iter().any(|c| c.id() == connection.id()) {
            return false;
        }
        debug!(connection = %connection.id(), total = connections.len() + 1, "connection added");
        connections.push(connection);
        true
    }

    /// Stop tracking a connection.
    pub fn remove(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        let mut connections = self.connections.lock();
        let index = connections.iter().position(|c| c.id() == id)?;
        Some(connections.remove(index))
    }

    pub fn get(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.lock().iter().find(|c| c.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }

    fn first(&self) -> Option<Arc<Connection>> {
        self.connections.lock().first().cloned()
    }

    /// Send a fresh request on the oldest connection.
    pub async fn send(
        &self,
        opcode: Opcode,
        device_id: DeviceId,
        user_id: UserId,
        data: &PayloadData,
    ) -> Result<PacketSequence> {
        let connection = self.first().ok_or(DomainError::NoConnectionAvailable {
            opcode: opcode.name(),
        })?;
        connection.send(opcode, device_id, user_id, data).await
    }

    /// Reply on the connection the request arrived on, falling back to the
    /// oldest one when that connection is already gone.
    pub async fn respond(
        &self,
        via: ConnectionId,
        request: &Packet,
        opcode: Opcode,
        data: &PayloadData,
    ) -> Result<()> {
        let connection =
            self.get(via)
                .or_else(|| self.first())
                .ok_or(DomainError::NoConnectionAvailable {
                    opcode: opcode.name(),
                })?;
        connection.respond(request, opcode, data).await
    }

    /// Close every tracked connection and forget them.
    pub async fn close_all(&self) {
        let connections = std::mem::take(&mut *self.connections.lock());
        for connection in connections {
            connection.close().await;
        }
    }
}
