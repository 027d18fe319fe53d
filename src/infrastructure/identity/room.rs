//! Room selection at connect time.

use crate::domain::{ConnectContext, RoomName, RoomNameError, RoomNameSource};

/// Honors the room the client asked for, falling back to a default.
#[derive(Debug, Clone)]
pub struct RequestedRoomSource {
    default_room: RoomName,
}

impl RequestedRoomSource {
    pub fn new(default_room: RoomName) -> Self {
        Self { default_room }
    }
}

impl RoomNameSource for RequestedRoomSource {
    fn resolve(&self, ctx: &ConnectContext) -> Result<RoomName, RoomNameError> {
        match ctx.requested_room.as_deref() {
            Some(requested) => RoomName::parse(requested),
            None => Ok(self.default_room.clone()),
        }
    }
}

/// Always the same room, whatever the client asks for.
#[derive(Debug, Clone, Default)]
pub struct FixedRoomSource {
    room: RoomName,
}

impl FixedRoomSource {
    pub fn new(room: RoomName) -> Self {
        Self { room }
    }
}

impl RoomNameSource for FixedRoomSource {
    fn resolve(&self, _ctx: &ConnectContext) -> Result<RoomName, RoomNameError> {
        Ok(self.room.clone())
    }
}
