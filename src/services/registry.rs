//! # Chat Connection Registry
//!
//! Tracks which live chat connections belong to which room and fans messages
//! out to them.
//!
//! Each connection is represented by a [`ConnectionHandle`]: the sending half
//! of an unbounded channel whose receiving half is drained by that socket's
//! writer task. Delivering a frame therefore never awaits the network, and a
//! send only fails once the writer task has gone away.
//!
//! ## Invariants
//!
//! - A room key is present only while at least one connection is registered
//!   under it. The entry is removed as soon as its last member leaves.
//! - [`ConnectionRegistry::broadcast`] iterates over a snapshot of the room
//!   taken under the shard lock, so concurrent joins and leaves are never
//!   blocked for the duration of a fan-out.
//! - Handles whose channel is closed are evicted after the broadcast that
//!   discovered them.

use axum::extract::ws::Utf8Bytes;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};
use uuid::Uuid;

pub type RoomId = i32;

/// Serialized frame ready to be written to a socket
pub type Frame = Utf8Bytes;

/// Identifies one connection, independent of the user behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound side of one client connection.
///
/// Cloning a handle is cheap and yields the same connection: equality is by
/// [`ConnectionId`].
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    user_id: i64,
    tx: mpsc::UnboundedSender<Frame>,
}

impl ConnectionHandle {
    /// Creates a handle for `user_id` and the receiver its writer task drains.
    pub fn new(user_id: i64) -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Self {
            id: ConnectionId::new(),
            user_id,
            tx,
        };
        (handle, rx)
    }

    #[inline]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    #[inline]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    fn send(&self, frame: Frame) -> Result<(), mpsc::error::SendError<Frame>> {
        self.tx.send(frame)
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

/// Room id -> connections currently open in that room, in join order.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    rooms: DashMap<RoomId, Vec<ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Registers `connection` under `room_id`, allocating the room entry on first join.
    ///
    /// A user may hold several connections in the same room (one per device).
    /// Callers must have checked that the user is a participant of the room.
    pub fn join(&self, room_id: RoomId, connection: ConnectionHandle) {
        let connection_id = connection.id;
        let user_id = connection.user_id;

        let total = {
            let mut members = self.rooms.entry(room_id).or_default();
            members.push(connection);
            members.len()
        };

        debug!(room_id, user_id, %connection_id, total, "Connection joined room");
    }

    /// Removes one registration of `connection_id` from `room_id`.
    ///
    /// Returns false when the connection was not registered there. The room
    /// entry is dropped once it has no members left.
    pub fn leave(&self, room_id: RoomId, connection_id: ConnectionId) -> bool {
        let removed = match self.rooms.get_mut(&room_id) {
            Some(mut members) => match members.iter().position(|c| c.id == connection_id) {
                Some(index) => {
                    members.remove(index);
                    true
                }
                None => false,
            },
            None => false,
        };

        // Re-checked under the shard lock: a join may have landed in between.
        let pruned = self
            .rooms
            .remove_if(&room_id, |_, members| members.is_empty())
            .is_some();

        if removed {
            debug!(room_id, %connection_id, pruned, "Connection left room");
        } else {
            trace!(room_id, %connection_id, "Leave for unregistered connection ignored");
        }

        removed
    }

    /// Serializes `event` once and delivers it to every connection of `room_id`
    /// except `exclude`.
    ///
    /// Returns the number of connections the frame was handed to. A room with
    /// no registered connections is a no-op. A failed delivery is logged, does
    /// not stop the fan-out, and evicts the dead handle afterwards.
    pub fn broadcast<T: Serialize>(
        &self,
        room_id: RoomId,
        event: &T,
        exclude: Option<ConnectionId>,
    ) -> usize {
        let snapshot = match self.rooms.get(&room_id) {
            Some(members) => members.value().clone(),
            None => {
                trace!(room_id, "Broadcast to room without connections skipped");
                return 0;
            }
        };

        let frame = match serde_json::to_string(event) {
            Ok(json) => Frame::from(json),
            Err(e) => {
                error!(room_id, error = %e, "Failed to serialize broadcast event");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for connection in snapshot
            .iter()
            .filter(|c| exclude.is_none_or(|excluded| c.id != excluded))
        {
            match connection.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    warn!(
                        room_id,
                        user_id = connection.user_id,
                        connection_id = %connection.id,
                        "Broadcast delivery failed, connection is closed"
                    );
                    dead.push(connection.id);
                }
            }
        }

        for connection_id in dead {
            self.leave(room_id, connection_id);
        }

        trace!(room_id, delivered, "Broadcast finished");
        delivered
    }

    /// Number of connections registered under `room_id`.
    pub fn connection_count(&self, room_id: RoomId) -> usize {
        self.rooms.get(&room_id).map_or(0, |members| members.len())
    }

    /// Number of rooms with at least one connection.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains_room(&self, room_id: RoomId) -> bool {
        self.rooms.contains_key(&room_id)
    }
}
