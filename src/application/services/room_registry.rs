//! Room Registry
//!
//! Maps room names to their member connections. Every mutation of a room
//! happens under that room's `DashMap` shard lock, which makes `join`,
//! `leave` and `members` linearizable per room without a global lock.
//! Empty rooms are evicted under the same lock, so eviction can never race
//! a concurrent join for the same name.
//!
//! Lock order is always shard lock → connection room set.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};

use crate::application::connection::Connection;
use crate::domain::{ConnectionId, RoomName};
use crate::infrastructure::metrics;
use crate::shared::error::RelayError;

type Members = HashMap<ConnectionId, Arc<Connection>>;

/// Room → member set, owned by the application and injected where needed.
pub struct RoomRegistry {
    rooms: DashMap<RoomName, Members>,
    evict_empty: bool,
}

impl RoomRegistry {
    /// Create an empty registry. With `evict_empty`, rooms are removed as
    /// soon as their last member leaves.
    pub fn new(evict_empty: bool) -> Self {
        Self {
            rooms: DashMap::new(),
            evict_empty,
        }
    }

    /// Add `connection` to `room`, creating the room if needed.
    ///
    /// Returns `Ok(false)` when the connection was already a member.
    ///
    /// # Errors
    ///
    /// [`RelayError::Closed`] if the connection has begun closing.
    pub fn join(&self, room: &RoomName, connection: &Arc<Connection>) -> Result<bool, RelayError> {
        let joined = {
            let mut members = self.rooms.entry(room.clone()).or_default();
            if members.contains_key(&connection.id()) {
                return Ok(false);
            }
            connection
                .track_room(room)
                .map(|()| members.insert(connection.id(), Arc::clone(connection)))
        };

        if let Err(e) = joined {
            self.evict_if_empty(room);
            return Err(e);
        }

        metrics::set_rooms_active(self.rooms.len());
        tracing::debug!(room = %room, connection_id = %connection.id(), "Joined room");
        Ok(true)
    }

    /// Remove `connection_id` from `room`. No-op if it was not a member.
    ///
    /// Returns whether a membership was removed.
    pub fn leave(&self, room: &RoomName, connection_id: ConnectionId) -> bool {
        let removed = match self.rooms.entry(room.clone()) {
            Entry::Occupied(mut entry) => {
                let removed = entry.get_mut().remove(&connection_id);
                if let Some(connection) = &removed {
                    connection.untrack_room(room);
                }
                if self.evict_empty && entry.get().is_empty() {
                    entry.remove();
                }
                removed.is_some()
            }
            Entry::Vacant(_) => false,
        };

        if removed {
            metrics::set_rooms_active(self.rooms.len());
            tracing::debug!(room = %room, connection_id = %connection_id, "Left room");
        }
        removed
    }

    /// Point-in-time snapshot of the members of `room`.
    ///
    /// An absent room and an empty room both yield an empty snapshot.
    pub fn members(&self, room: &RoomName) -> Vec<Arc<Connection>> {
        self.rooms
            .get(room)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, room: &RoomName) -> usize {
        self.rooms.get(room).map(|members| members.len()).unwrap_or(0)
    }

    pub fn is_member(&self, room: &RoomName, connection_id: ConnectionId) -> bool {
        self.rooms
            .get(room)
            .map(|members| members.contains_key(&connection_id))
            .unwrap_or(false)
    }

    /// Number of rooms with a registry entry (including empty ones when
    /// eviction is off).
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn evict_if_empty(&self, room: &RoomName) {
        if self.evict_empty {
            self.rooms.remove_if(room, |_, members| members.is_empty());
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}
