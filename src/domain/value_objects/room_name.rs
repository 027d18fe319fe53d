//! Room names.
//!
//! A room name follows the same rules as a channel-layer group name:
//! ASCII letters, digits, hyphens, underscores and periods, shorter than
//! 100 characters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Room every connection lands in unless it asks for another one.
pub const DEFAULT_ROOM: &str = "community_chatroom";

/// Maximum room name length (exclusive upper bound is 100).
pub const MAX_ROOM_NAME_LENGTH: usize = 99;

/// Reasons a room name is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomNameError {
    #[error("room name must not be empty")]
    Empty,

    #[error("room name is {0} characters long, the limit is {MAX_ROOM_NAME_LENGTH}")]
    TooLong(usize),

    #[error("room name contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Validated room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomName(String);

impl RoomName {
    /// Validate and wrap a room name.
    pub fn parse(raw: impl Into<String>) -> Result<Self, RoomNameError> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(RoomNameError::Empty);
        }

        let len = raw.chars().count();
        if len > MAX_ROOM_NAME_LENGTH {
            return Err(RoomNameError::TooLong(len));
        }

        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(RoomNameError::InvalidCharacter(bad));
        }

        Ok(Self(raw))
    }

    /// The community room.
    pub fn community() -> Self {
        Self(DEFAULT_ROOM.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomName {
    fn default() -> Self {
        Self::community()
    }
}

impl FromStr for RoomName {
    type Err = RoomNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomName {
    type Error = RoomNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<RoomName> for String {
    fn from(room: RoomName) -> Self {
        room.0
    }
}

impl AsRef<str> for RoomName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
