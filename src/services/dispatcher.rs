//! Best-effort notification dispatch.
//!
//! The dispatcher is the single seam between domain events and the real-time
//! transport. Delivery is at-most-once: no retry, no acknowledgment, no
//! timeout beyond what the transport itself does. Every call completes
//! normally; the attempt's result is captured in a [`DeliveryOutcome`] so the
//! never-propagate contract stays visible to callers and tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::metrics;
use crate::models::Notification;
use crate::websocket::RECEIVE_NOTIFICATION;

/// Failures surfaced by the real-time transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("payload serialization failed: {0}")]
    Serialization(String),

    #[error("transport send failed: {0}")]
    Send(String),
}

/// Send-to-user-group primitive supplied by the real-time transport.
///
/// The connection registry implements this in production; tests substitute
/// recording or failing doubles.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn send_to_user(
        &self,
        user_id: &str,
        tag: &str,
        payload: Value,
    ) -> Result<(), TransportError>;
}

/// Result of one delivery attempt. Informational only; no variant is an error
/// the caller must handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Transport accepted the push
    Delivered,
    /// Precondition failed (blank recipient id); transport never invoked
    SkippedInvalidRecipient,
    /// Transport reported a failure; logged and swallowed
    Failed,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::SkippedInvalidRecipient => "skipped_invalid_recipient",
            DeliveryOutcome::Failed => "failed",
        }
    }
}

/// Pushes notifications to all live connections of one user
pub struct NotificationDispatcher {
    transport: Arc<dyn RealtimeTransport>,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn RealtimeTransport>) -> Self {
        Self { transport }
    }

    /// Attempt delivery of `notification` to `user_id`.
    ///
    /// Stateless, single-step; concurrent dispatches are independent. Never
    /// returns an error: a blank recipient id skips the send, and any
    /// transport fault is logged with full context and swallowed.
    pub async fn dispatch(&self, user_id: &str, notification: &Notification) -> DeliveryOutcome {
        if user_id.trim().is_empty() {
            warn!(
                notification_id = %notification.id,
                notification_type = notification.notification_type.as_str(),
                "dispatch skipped: empty recipient id"
            );
            let outcome = DeliveryOutcome::SkippedInvalidRecipient;
            metrics::observe_dispatch(outcome.as_str());
            return outcome;
        }

        let payload = match serde_json::to_value(notification) {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    user_id = %user_id,
                    notification_id = %notification.id,
                    notification_type = notification.notification_type.as_str(),
                    error = %e,
                    "failed to serialize notification payload"
                );
                let outcome = DeliveryOutcome::Failed;
                metrics::observe_dispatch(outcome.as_str());
                return outcome;
            }
        };

        let outcome = match self
            .transport
            .send_to_user(user_id, RECEIVE_NOTIFICATION, payload)
            .await
        {
            Ok(()) => {
                debug!(
                    user_id = %user_id,
                    notification_id = %notification.id,
                    notification_type = notification.notification_type.as_str(),
                    "notification pushed"
                );
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                error!(
                    user_id = %user_id,
                    notification_id = %notification.id,
                    notification_type = notification.notification_type.as_str(),
                    error = %e,
                    "notification push failed"
                );
                DeliveryOutcome::Failed
            }
        };

        metrics::observe_dispatch(outcome.as_str());
        outcome
    }
}
