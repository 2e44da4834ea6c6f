use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// One chat thread per booking, id `{service_id}_{booking_ref}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub chat_id: String,
    pub service_id: String,
    pub booking_ref: String,
    /// Timestamp of the newest message the service provider has read.
    pub last_read_by_sp: Option<DateTime>,
    pub created_at: DateTime,
}

impl Chat {
    pub const COLLECTION: &'static str = "chats";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub chat_id: String,
    pub message_id: String,
    pub sent_by: ChatParty,
    pub text: Option<String>,
    pub timestamp: DateTime,
}

impl ChatMessage {
    pub const COLLECTION: &'static str = "chat_messages";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatParty {
    User,
    Sp,
}

/// One record per push sent for an unread run; consulted to avoid spamming
/// the provider with one notification per message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatNotificationSent {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub chat_id: String,
    pub message_id: String,
    pub timestamp: DateTime,
}

impl ChatNotificationSent {
    pub const COLLECTION: &'static str = "chat_notifications_sent";
}
