use serde::{Deserialize, Serialize};

/// Document-change events accepted on the ingestion endpoint. Each kind maps
/// to one handler in [`crate::handlers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BookingCreated,
    BookingUpdated,
    TaskCreated,
    TaskSubmissionCreated,
    EmployeeCreated,
    ServiceUpdated,
    EditRequestUpdated,
    ChatMessageCreated,
    OrderCompleted,
    OrderUpdated,
    UserUpdated,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookingCreated => "booking_created",
            Self::BookingUpdated => "booking_updated",
            Self::TaskCreated => "task_created",
            Self::TaskSubmissionCreated => "task_submission_created",
            Self::EmployeeCreated => "employee_created",
            Self::ServiceUpdated => "service_updated",
            Self::EditRequestUpdated => "edit_request_updated",
            Self::ChatMessageCreated => "chat_message_created",
            Self::OrderCompleted => "order_completed",
            Self::OrderUpdated => "order_updated",
            Self::UserUpdated => "user_updated",
        }
    }
}

/// A change notification for a single document. `before`/`after` carry the
/// document snapshots as loose JSON; handlers only use them to detect edges
/// and re-fetch the authoritative record from the database before acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEnvelope {
    pub kind: EventKind,
    #[serde(default)]
    pub service_id: Option<String>,
    /// Identifier of the changed document within its collection: booking_ref,
    /// order_ref, task_id, employee_id, request_id or message_id by kind.
    #[serde(default)]
    pub doc_id: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub before: Option<serde_json::Value>,
    #[serde(default)]
    pub after: Option<serde_json::Value>,
    #[serde(default)]
    pub occurred_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ChangeEnvelope {
    pub fn require_service_id(&self) -> Result<&str, String> {
        self.service_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("{} event missing service_id", self.kind.as_str()))
    }

    pub fn require_doc_id(&self) -> Result<&str, String> {
        self.doc_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("{} event missing doc_id", self.kind.as_str()))
    }

    /// Reads a field from the `before` snapshot, if present.
    pub fn before_field(&self, name: &str) -> Option<&serde_json::Value> {
        self.before.as_ref().and_then(|v| v.get(name))
    }

    /// Reads a field from the `after` snapshot, if present.
    pub fn after_field(&self, name: &str) -> Option<&serde_json::Value> {
        self.after.as_ref().and_then(|v| v.get(name))
    }

    pub fn before_bool(&self, name: &str) -> Option<bool> {
        self.before_field(name).and_then(|v| v.as_bool())
    }

    pub fn after_bool(&self, name: &str) -> Option<bool> {
        self.after_field(name).and_then(|v| v.as_bool())
    }

    pub fn before_str(&self, name: &str) -> Option<&str> {
        self.before_field(name).and_then(|v| v.as_str())
    }

    pub fn after_str(&self, name: &str) -> Option<&str> {
        self.after_field(name).and_then(|v| v.as_str())
    }
}
