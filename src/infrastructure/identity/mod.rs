//! Default collaborator implementations.
//!
//! - **JwtIdentityResolver** / **AnonymousIdentityResolver**: who is connecting
//! - **RequestedRoomSource** / **FixedRoomSource**: which room they land in

mod jwt;
mod room;

pub use jwt::{AnonymousIdentityResolver, Claims, JwtIdentityResolver};
pub use room::{FixedRoomSource, RequestedRoomSource};
