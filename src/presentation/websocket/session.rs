//! WebSocket Session Management

use std::time::{Duration, Instant};

use crate::domain::ConnectionId;

/// Reader-side bookkeeping for one connection.
#[derive(Debug)]
pub struct SessionState {
    pub connection_id: ConnectionId,
    pub frames_received: u64,
    pub protocol_errors: u32,
    pub connected_at: Instant,
    pub last_activity: Instant,
}

impl SessionState {
    pub fn new(connection_id: ConnectionId) -> Self {
        let now = Instant::now();
        Self {
            connection_id,
            frames_received: 0,
            protocol_errors: 0,
            connected_at: now,
            last_activity: now,
        }
    }

    pub fn record_frame(&mut self) {
        self.frames_received += 1;
        self.last_activity = Instant::now();
    }

    /// Count a malformed frame, returning the running total.
    pub fn record_protocol_error(&mut self) -> u32 {
        self.protocol_errors += 1;
        self.protocol_errors
    }

    /// Whether the tolerated number of malformed frames has been reached.
    /// A limit of 0 never trips.
    pub fn exceeded(&self, limit: u32) -> bool {
        limit > 0 && self.protocol_errors >= limit
    }

    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Time since the last frame arrived.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}
