//! Fan-out policies.

use serde::{Deserialize, Serialize};

/// Whether a sender receives its own broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoPolicy {
    /// Everyone in the room at routing time, sender included.
    #[default]
    IncludeSender,
    /// Everyone except the sender.
    ExcludeSender,
}

/// What happens when a recipient's outbound queue is saturated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Close the slow recipient. Keeps per-sender FIFO intact for everyone
    /// who stays connected.
    #[default]
    Disconnect,
    /// Drop the message for that recipient only.
    DropNewest,
}

/// Policy pair applied by the broadcast hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryPolicy {
    pub echo: EchoPolicy,
    pub overflow: OverflowPolicy,
}

impl DeliveryPolicy {
    pub fn new(echo: EchoPolicy, overflow: OverflowPolicy) -> Self {
        Self { echo, overflow }
    }
}
