use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

use super::messages::Envelope;
use crate::metrics;
use crate::services::dispatcher::{RealtimeTransport, TransportError};

/// Unique handle for one WebSocket connection.
///
/// Each connection gets its own id at registration time so disconnect can
/// remove exactly that handle, even when the user holds several connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct Subscriber {
    id: ConnectionId,
    sender: UnboundedSender<String>,
}

/// Explicit user-group membership for the real-time channel.
///
/// Maps resolved user identifiers to the set of live connections registered
/// under them. Registration happens only after identity resolution succeeds;
/// a connection without a resolved identifier is never added here.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    // user_id -> subscribers holding that user's open connections
    inner: Arc<RwLock<HashMap<String, Vec<Subscriber>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection under a resolved user id.
    ///
    /// Returns the receiver the session pumps into its socket.
    pub async fn register(
        &self,
        user_id: &str,
        connection_id: ConnectionId,
    ) -> UnboundedReceiver<String> {
        let (tx, rx) = unbounded_channel();

        let mut guard = self.inner.write().await;
        guard.entry(user_id.to_string()).or_default().push(Subscriber {
            id: connection_id,
            sender: tx,
        });

        metrics::inc_ws_connections();
        tracing::debug!(
            user_id = %user_id,
            connection_id = %connection_id,
            connections = guard.get(user_id).map(|v| v.len()).unwrap_or(0),
            "registered websocket connection"
        );

        rx
    }

    /// Remove one connection handle. Must be called when the socket closes,
    /// otherwise the sender leaks until the next failed fanout.
    pub async fn deregister(&self, user_id: &str, connection_id: ConnectionId) {
        let mut guard = self.inner.write().await;

        if let Some(subscribers) = guard.get_mut(user_id) {
            let before = subscribers.len();
            subscribers.retain(|s| s.id != connection_id);

            if subscribers.len() != before {
                metrics::dec_ws_connections();
                tracing::debug!(
                    user_id = %user_id,
                    connection_id = %connection_id,
                    remaining = subscribers.len(),
                    "deregistered websocket connection"
                );
            }

            if subscribers.is_empty() {
                guard.remove(user_id);
            }
        }
    }

    pub async fn connection_count(&self, user_id: &str) -> usize {
        let guard = self.inner.read().await;
        guard.get(user_id).map(|v| v.len()).unwrap_or(0)
    }

    pub async fn total_connections(&self) -> usize {
        let guard = self.inner.read().await;
        guard.values().map(|v| v.len()).sum()
    }

    pub async fn connected_users(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    pub async fn connected_user_ids(&self) -> Vec<String> {
        let guard = self.inner.read().await;
        guard.keys().cloned().collect()
    }
}

#[async_trait]
impl RealtimeTransport for ConnectionRegistry {
    /// Fan a tagged payload out to every live connection of one user.
    ///
    /// A user with no connections is not an error: best-effort delivery means
    /// the push is simply dropped when no route exists. Dead senders are
    /// reaped during fanout.
    async fn send_to_user(
        &self,
        user_id: &str,
        tag: &str,
        payload: serde_json::Value,
    ) -> Result<(), TransportError> {
        let frame = Envelope::new(tag, payload)
            .to_json()
            .map_err(|e| TransportError::Serialization(e.to_string()))?;

        let mut guard = self.inner.write().await;
        if let Some(subscribers) = guard.get_mut(user_id) {
            let before = subscribers.len();
            subscribers.retain(|s| s.sender.send(frame.clone()).is_ok());

            let dropped = before - subscribers.len();
            if dropped > 0 {
                metrics::sub_ws_connections(dropped as i64);
                tracing::debug!(
                    user_id = %user_id,
                    dropped = dropped,
                    "reaped closed connections during fanout"
                );
            }

            if subscribers.is_empty() {
                guard.remove(user_id);
            }
        }

        Ok(())
    }
}
