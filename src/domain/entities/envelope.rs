//! Message envelope.
//!
//! An envelope lives only for the duration of one fan-out. It is shared
//! between every recipient queue as `Arc<Envelope>` and never mutated.

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{ConnectionId, RoomName};

/// One inbound message on its way to the members of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    room: RoomName,
    sender: ConnectionId,
    payload: String,
    received_at: DateTime<Utc>,
}

impl Envelope {
    /// Stamp a payload with its room, sender and ingress time.
    pub fn new(room: RoomName, sender: ConnectionId, payload: impl Into<String>) -> Self {
        Self {
            room,
            sender,
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }

    pub fn room(&self) -> &RoomName {
        &self.room
    }

    pub fn sender(&self) -> ConnectionId {
        self.sender
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Whether this envelope originated from `connection`.
    pub fn is_from(&self, connection: ConnectionId) -> bool {
        self.sender == connection
    }
}
