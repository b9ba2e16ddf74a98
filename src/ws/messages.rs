//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp. Optional on client messages.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with `timestamp`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        msg_type: WsMessageType,
        timestamp: DateTime<Utc>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp,
            payload,
        }
    }

    /// Builds an error message with a numeric code.
    #[must_use]
    pub fn error(id: impl Into<String>, timestamp: DateTime<Utc>, code: u32, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            timestamp,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands a client can send in a `command` message payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events for specific products.
    Subscribe {
        /// Product IDs to subscribe to. Use `["*"]` for all products.
        product_ids: Vec<String>,
    },
    /// Unsubscribe from events for specific products.
    Unsubscribe {
        /// Product IDs to unsubscribe from.
        product_ids: Vec<String>,
    },
    /// Check a product's price now (same as the REST refresh).
    Refresh {
        /// Target product ID.
        product_id: String,
    },
    /// Fetch a product's current state.
    GetProduct {
        /// Target product ID.
        product_id: String,
    },
    /// Fetch the activity feed.
    GetActivity,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn client_message_needs_only_type_and_payload() {
        let raw = r#"{"type":"command","payload":{"command":"subscribe","product_ids":["*"]}}"#;
        let Ok(msg) = serde_json::from_str::<WsMessage>(raw) else {
            panic!("minimal command should parse");
        };
        assert_eq!(msg.msg_type, WsMessageType::Command);

        let Ok(cmd) = serde_json::from_value::<WsCommand>(msg.payload) else {
            panic!("payload should be a command");
        };
        assert_eq!(
            cmd,
            WsCommand::Subscribe {
                product_ids: vec!["*".to_string()]
            }
        );
    }

    #[test]
    fn unit_commands_parse() {
        let cmd = serde_json::from_str::<WsCommand>(r#"{"command":"get_activity"}"#);
        assert!(matches!(cmd, Ok(WsCommand::GetActivity)));
    }
}
