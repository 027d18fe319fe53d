//! WebSocket Message Types
//!
//! The relay speaks one frame shape in both directions: `{"message": "..."}`.

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes};
use futures::future::{self, Ready};
use serde::{Deserialize, Serialize};

use crate::application::Outbound;
use crate::shared::error::RelayError;

/// Client → server frame. Any other shape is a protocol error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InboundFrame {
    pub message: String,
}

impl InboundFrame {
    /// Only a JSON object is a frame. The derived impl would also take the
    /// sequence form (`["hi"]`), so the shape is checked first.
    pub fn decode(text: &str) -> Result<Self, RelayError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| RelayError::Protocol(e.to_string()))?;

        if !value.is_object() {
            return Err(RelayError::Protocol("frame must be a JSON object".into()));
        }

        serde_json::from_value(value).map_err(|e| RelayError::Protocol(e.to_string()))
    }
}

/// Server → client frame, identical in shape to [`InboundFrame`].
#[derive(Debug, Serialize)]
pub struct OutboundFrame<'a> {
    pub message: &'a str,
}

/// Turn a writer item into a WebSocket message. Used as the `SinkExt::with`
/// adapter in front of the socket.
pub fn encode_outbound(outbound: Outbound) -> Ready<Result<Message, axum::Error>> {
    let message = match outbound {
        Outbound::Deliver(envelope) => serde_json::to_string(&OutboundFrame {
            message: envelope.payload(),
        })
        .map(|text| Message::Text(text.into()))
        .map_err(axum::Error::new),
        Outbound::Close(reason) => Ok(Message::Close(Some(CloseFrame {
            code: reason.code(),
            reason: Utf8Bytes::from_static(reason.as_str()),
        }))),
    };
    future::ready(message)
}
