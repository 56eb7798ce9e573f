use actix::Recipient;
use log::{debug, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::game::Color;
use crate::models::game_state::GameId;
use crate::models::messages::{Deliver, ServerMessage};

/// Identifier of one accepted socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        ConnectionId(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        ConnectionId::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Part a connection plays in its game
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    White,
    Black,
    Spectator,
}

impl Role {
    pub fn color(self) -> Option<Color> {
        match self {
            Role::White => Some(Color::White),
            Role::Black => Some(Color::Black),
            Role::Spectator => None,
        }
    }
}

impl From<Color> for Role {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Role::White,
            Color::Black => Role::Black,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("connection is closed")]
    Closed,
}

/// Where frames for one connection go.
pub trait Outbox: Send + Sync {
    fn deliver(&self, frame: Arc<str>) -> Result<(), DeliveryError>;
}

impl Outbox for Recipient<Deliver> {
    fn deliver(&self, frame: Arc<str>) -> Result<(), DeliveryError> {
        if !self.connected() {
            return Err(DeliveryError::Closed);
        }
        self.do_send(Deliver(frame));
        Ok(())
    }
}

/// Per-connection metadata
pub struct Connection {
    outbox: Arc<dyn Outbox>,
    game_id: Option<GameId>,
    role: Option<Role>,
    name: Option<String>,
    connected: bool,
}

/// Snapshot of a connection's attachment, copied out of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub game_id: GameId,
    pub role: Role,
    pub name: String,
}

/// Table of live connections.
///
/// Its lock is never held while the registry or a session lock is being taken.
#[derive(Default)]
pub struct ConnectionTable {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        ConnectionTable::default()
    }

    pub fn register(&self, id: ConnectionId, outbox: Arc<dyn Outbox>) {
        let mut connections = self.connections.lock();
        connections.insert(
            id,
            Connection {
                outbox,
                game_id: None,
                role: None,
                name: None,
                connected: true,
            },
        );
        debug!("Registered connection {} ({} live)", id, connections.len());
    }

    /// Drops the connection and returns what it was attached to.
    pub fn unregister(&self, id: ConnectionId) -> Option<Attachment> {
        let mut connections = self.connections.lock();
        let connection = connections.remove(&id)?;
        debug!("Unregistered connection {} ({} live)", id, connections.len());
        attachment_of(&connection)
    }

    pub fn attach(&self, id: ConnectionId, game_id: GameId, role: Role, name: &str) {
        if let Some(connection) = self.connections.lock().get_mut(&id) {
            connection.game_id = Some(game_id);
            connection.role = Some(role);
            connection.name = Some(name.to_string());
        }
    }

    /// Clears the attachment, returning it.
    pub fn detach(&self, id: ConnectionId) -> Option<Attachment> {
        let mut connections = self.connections.lock();
        let connection = connections.get_mut(&id)?;
        let attachment = attachment_of(connection);
        connection.game_id = None;
        connection.role = None;
        attachment
    }

    pub fn attachment(&self, id: ConnectionId) -> Option<Attachment> {
        self.connections.lock().get(&id).and_then(attachment_of)
    }

    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections
            .lock()
            .get(&id)
            .map_or(false, |connection| connection.connected)
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sends one message to a single connection.
    pub fn send(&self, id: ConnectionId, message: &ServerMessage) {
        if let Some(frame) = encode(message) {
            self.deliver(&[id], frame);
        }
    }

    /// Sends one message to every listed connection, serialising it once.
    pub fn broadcast(&self, ids: &[ConnectionId], message: &ServerMessage) {
        if let Some(frame) = encode(message) {
            self.deliver(ids, frame);
        }
    }

    /// Best effort: a failed delivery marks that connection disconnected and
    /// the rest still get the frame.
    fn deliver(&self, ids: &[ConnectionId], frame: Arc<str>) {
        let targets: Vec<(ConnectionId, Arc<dyn Outbox>)> = {
            let connections = self.connections.lock();
            ids.iter()
                .filter_map(|id| {
                    connections
                        .get(id)
                        .filter(|connection| connection.connected)
                        .map(|connection| (*id, Arc::clone(&connection.outbox)))
                })
                .collect()
        };

        let mut failed = Vec::new();
        for (id, outbox) in targets {
            if let Err(e) = outbox.deliver(Arc::clone(&frame)) {
                warn!("Delivery to connection {} failed: {}", id, e);
                failed.push(id);
            }
        }

        if !failed.is_empty() {
            let mut connections = self.connections.lock();
            for id in failed {
                if let Some(connection) = connections.get_mut(&id) {
                    connection.connected = false;
                }
            }
        }
    }
}

fn attachment_of(connection: &Connection) -> Option<Attachment> {
    Some(Attachment {
        game_id: connection.game_id.clone()?,
        role: connection.role?,
        name: connection.name.clone().unwrap_or_default(),
    })
}

fn encode(message: &ServerMessage) -> Option<Arc<str>> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Arc::from(text)),
        Err(e) => {
            warn!("Error serializing message: {}", e);
            None
        }
    }
}
