//! Worker/page message protocol.
//!
//! Messages are plain structured data with a `type` tag:
//!
//! ```text
//! { "type": "requestOfflineMode" }
//! { "type": "offlineMode", "val": true|false }
//! ```
//!
//! Incoming payloads are validated once at the boundary with
//! [`ClientMessage::decode`]; everything past that point matches on the
//! closed [`ClientMessage`] enum.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a page instance controlled by a worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(u64);

impl ClientId {
    /// Wraps a raw identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// A message exchanged between the worker and a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Page asks the worker for the current connectivity state.
    RequestOfflineMode,
    /// Worker reports connectivity state to a page.
    OfflineMode {
        /// `true` when the origin is currently unreachable.
        val: bool,
    },
}

impl ClientMessage {
    /// Shorthand for an [`OfflineMode`](ClientMessage::OfflineMode) message.
    pub const fn offline_mode(val: bool) -> Self {
        Self::OfflineMode { val }
    }

    /// Decodes and validates a JSON payload.
    pub fn decode(payload: &str) -> Result<Self, MessageError> {
        serde_json::from_str(payload).map_err(MessageError::Decode)
    }

    /// Decodes an already parsed JSON value.
    pub fn decode_value(value: serde_json::Value) -> Result<Self, MessageError> {
        serde_json::from_value(value).map_err(MessageError::Decode)
    }

    /// Encodes the message as JSON.
    pub fn encode(&self) -> Result<String, MessageError> {
        serde_json::to_string(self).map_err(MessageError::Encode)
    }
}

/// Malformed message payload.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Payload is not a known message shape.
    #[error("invalid client message: {0}")]
    Decode(#[source] serde_json::Error),
    /// Message could not be serialized.
    #[error("failed to encode client message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A message could not be handed to its recipient.
///
/// Delivery is at-most-once; callers log this and move on.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The addressed page is not (or no longer) connected.
    #[error("{0} is no longer reachable")]
    ClientGone(ClientId),
    /// The receiving side has shut down.
    #[error("message channel closed")]
    Closed,
}

/// Fire-and-forget sending half of a message channel.
///
/// `post_message` never blocks and never waits for an acknowledgement.
pub trait MessagePort: Send + Sync {
    /// Hands `message` to the other side.
    fn post_message(&self, message: ClientMessage) -> Result<(), DeliveryError>;

    /// Tells the other side this end is going away.
    ///
    /// Messages addressed to this end afterwards are dropped. Does nothing by
    /// default.
    fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn wire_format_matches_protocol() {
        assert_eq!(
            serde_json::to_value(ClientMessage::RequestOfflineMode).unwrap(),
            json!({ "type": "requestOfflineMode" })
        );
        assert_eq!(
            serde_json::to_value(ClientMessage::offline_mode(true)).unwrap(),
            json!({ "type": "offlineMode", "val": true })
        );
    }

    #[test]
    fn decode_accepts_both_shapes() {
        assert_eq!(
            ClientMessage::decode(r#"{"type":"requestOfflineMode"}"#).unwrap(),
            ClientMessage::RequestOfflineMode
        );
        assert_eq!(
            ClientMessage::decode(r#"{"type":"offlineMode","val":false}"#).unwrap(),
            ClientMessage::offline_mode(false)
        );
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let err = ClientMessage::decode(r#"{"type":"pushSubscription"}"#).unwrap_err();
        assert!(matches!(err, MessageError::Decode(_)));
    }

    #[test]
    fn decode_rejects_offline_mode_without_val() {
        assert!(ClientMessage::decode_value(json!({ "type": "offlineMode" })).is_err());
    }

    #[test]
    fn encode_is_compact_json() {
        assert_eq!(
            ClientMessage::offline_mode(false).encode().unwrap(),
            r#"{"type":"offlineMode","val":false}"#
        );
    }
}
