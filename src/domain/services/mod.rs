//! # Domain Services
//!
//! Contracts for the collaborators consulted while a connection is admitted.
//!
//! - **IdentityResolver**: who is connecting
//! - **RoomNameSource**: which room they land in

mod connect;

pub use connect::*;
