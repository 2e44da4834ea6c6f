use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Result of one channel attempt within a dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub channel: Channel,
    pub status: OutcomeStatus,
    /// Present iff `status` is failed or skipped.
    pub reason: Option<String>,
    pub timestamp: DateTime,
}

impl NotificationOutcome {
    pub fn sent(channel: Channel) -> Self {
        Self {
            channel,
            status: OutcomeStatus::Sent,
            reason: None,
            timestamp: DateTime::now(),
        }
    }

    pub fn failed(channel: Channel, reason: impl Into<String>) -> Self {
        Self {
            channel,
            status: OutcomeStatus::Failed,
            reason: Some(reason.into()),
            timestamp: DateTime::now(),
        }
    }

    pub fn skipped(channel: Channel, reason: impl Into<String>) -> Self {
        Self {
            channel,
            status: OutcomeStatus::Skipped,
            reason: Some(reason.into()),
            timestamp: DateTime::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Push,
    Email,
    Whatsapp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Sent,
    Failed,
    Skipped,
}

/// Durable record of one dispatch attempt, written after all channels settle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub event_kind: String,
    /// Path identifying the subject document, e.g. `svc123/bk456`.
    pub subject: String,
    pub outcomes: Vec<NotificationOutcome>,
    pub completed_at: DateTime,
}

impl DispatchRecord {
    pub const COLLECTION: &'static str = "notification_log";
}
