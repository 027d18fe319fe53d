//! Application Services
//!
//! - **RoomRegistry**: room → member set, linearizable per room
//! - **BroadcastHub**: stateless fan-out of inbound messages to room members

mod broadcast_hub;
mod room_registry;

pub use broadcast_hub::{BroadcastHub, RouteReport};
pub use room_registry::RoomRegistry;
