//! # Application Layer
//!
//! The relay's moving parts: connections with their bounded outbound queues,
//! the room registry and the broadcast hub that connects the two.

pub mod connection;
pub mod services;

pub use connection::{CloseReason, Connection, ConnectionState, Outbound, OutboundQueue};
pub use services::{BroadcastHub, RoomRegistry, RouteReport};
