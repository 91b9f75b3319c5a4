/// Wire format for server pushes.
///
/// Every push is one JSON envelope. Clients subscribe to the
/// `ReceiveNotification` event, which carries the full notification value as
/// its single argument.
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::ConnectionId;

/// Event name carrying a notification push
pub const RECEIVE_NOTIFICATION: &str = "ReceiveNotification";

/// Event name confirming registration after connect
pub const CONNECTED: &str = "Connected";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub event: String,
    pub data: Value,
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Connection confirmation sent right after the session registers
    pub fn connected(connection_id: ConnectionId) -> Self {
        Self::new(
            CONNECTED,
            json!({
                "connection_id": connection_id.to_string(),
                "timestamp": chrono::Utc::now().timestamp(),
            }),
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
