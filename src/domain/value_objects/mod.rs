//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **ConnectionId**: unique, never-reused handle of a live connection
//! - **RoomName**: validated room identifier
//! - **Identity**: authenticated user or anonymous marker
//! - **DeliveryPolicy**: echo and overflow behavior of a broadcast

mod connection_id;
mod identity;
mod policy;
mod room_name;

pub use connection_id::*;
pub use identity::*;
pub use policy::*;
pub use room_name::*;
