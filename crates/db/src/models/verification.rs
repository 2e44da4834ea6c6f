use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A one-time numeric code. At most one live code per (subject_key, purpose);
/// a fresh send replaces any prior document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCode {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Document id or uid the code is bound to.
    pub subject_key: String,
    pub purpose: Purpose,
    pub code: String,
    /// Address or number the code was sent to.
    pub destination: String,
    pub created_at: DateTime,
    pub expires_at: DateTime,
}

impl VerificationCode {
    pub const COLLECTION: &'static str = "verification_codes";

    /// Whether the code is past its window at `now` (epoch millis).
    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis > self.expires_at.timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Verifying a service's notification email (10-minute window).
    NotificationEmail,
    /// Signup email ownership check (15-minute window).
    SignupEmail,
    /// Re-verification that unlocks a locked account (15-minute window).
    AccountUnlock,
}

impl Purpose {
    /// Validity window in minutes: 10 for notification-email verification,
    /// 15 for signup and account-unlock codes.
    pub fn window_minutes(self) -> i64 {
        match self {
            Purpose::NotificationEmail => 10,
            Purpose::SignupEmail | Purpose::AccountUnlock => 15,
        }
    }
}
