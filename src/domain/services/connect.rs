//! Connect-time collaborators.
//!
//! The relay trusts whatever identity the [`IdentityResolver`] hands back and
//! joins the connection to whatever room the [`RoomNameSource`] picks. Both
//! are injected at startup; the infrastructure layer ships defaults.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::value_objects::{Identity, RoomName, RoomNameError};

/// What the gateway knows about a connection before upgrading it.
#[derive(Debug, Clone, Default)]
pub struct ConnectContext {
    /// Bearer credential from the `Authorization` header or `token` query parameter.
    pub bearer_token: Option<String>,
    /// Room asked for in the URL path or `room` query parameter.
    pub requested_room: Option<String>,
    /// Remaining query parameters, untouched.
    pub query: HashMap<String, String>,
}

impl ConnectContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.requested_room = Some(room.into());
        self
    }
}

/// Identity resolution failures. Any of them rejects the handshake.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("credentials required")]
    Missing,

    #[error("invalid credentials: {0}")]
    Invalid(String),

    #[error("credentials expired")]
    Expired,
}

/// Maps a connection context to the identity of the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve the caller, falling back to [`Identity::Anonymous`] when the
    /// resolver permits unauthenticated connections.
    async fn resolve(&self, ctx: &ConnectContext) -> Result<Identity, IdentityError>;
}

/// Picks the room a new connection joins.
#[cfg_attr(test, mockall::automock)]
pub trait RoomNameSource: Send + Sync {
    fn resolve(&self, ctx: &ConnectContext) -> Result<RoomName, RoomNameError>;
}
