//! WebSocket Gateway
//!
//! Real-time relay over WebSocket connections.

pub mod gateway;
pub mod handler;
pub mod messages;
pub mod session;

pub use gateway::{Admission, Gateway};
pub use handler::{ws_handler, ws_room_handler};
pub use messages::{InboundFrame, OutboundFrame};
pub use session::SessionState;
