use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Tracking record for a dual-confirmation email change. The change commits
/// only once both parties have verified; the record is deleted on finalize
/// or cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailChangeRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Service id (contact-email changes) or uid (login-email changes).
    pub subject_key: String,
    pub kind: ChangeKind,
    pub old_email: String,
    pub new_email: String,
    pub old_token: String,
    pub new_token: String,
    #[serde(default)]
    pub old_verified: bool,
    #[serde(default)]
    pub new_verified: bool,
    pub created_at: DateTime,
}

impl EmailChangeRequest {
    pub const COLLECTION: &'static str = "email_change_requests";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The service's notification/contact address (`owner_email`).
    ContactEmail,
    /// The address the account signs in with.
    LoginEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Old,
    New,
}
