use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification category for marketplace events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// Freelancer submitted a proposal on a client's project
    ProposalReceived,
    /// Client accepted a proposal
    ProposalAccepted,
    /// Client rejected a proposal
    ProposalRejected,
    /// Project awarded to a freelancer
    ProjectAwarded,
    /// Milestone or project payment completed
    PaymentCompleted,
    /// Direct message notification
    Message,
    /// System notification
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::ProposalReceived => "proposal_received",
            NotificationType::ProposalAccepted => "proposal_accepted",
            NotificationType::ProposalRejected => "proposal_rejected",
            NotificationType::ProjectAwarded => "project_awarded",
            NotificationType::PaymentCompleted => "payment_completed",
            NotificationType::Message => "message",
            NotificationType::System => "system",
        }
    }
}

/// A notification addressed to one user.
///
/// Constructed by upstream domain services (proposal acceptance, payment
/// completion, ...) and handed to the dispatcher. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub notification_type: NotificationType,
    pub recipient_id: String,
    pub content: String,
    /// Id of the project/proposal/payment the event concerns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        notification_type: NotificationType,
        recipient_id: impl Into<String>,
        content: impl Into<String>,
        reference_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            notification_type,
            recipient_id: recipient_id.into(),
            content: content.into(),
            reference_id,
            created_at: Utc::now(),
        }
    }
}

/// Ingress body used by domain services to hand a notification to this service
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationRequest {
    pub recipient_id: String,
    pub notification_type: NotificationType,
    pub content: String,
    pub reference_id: Option<String>,
}
