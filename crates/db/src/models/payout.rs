use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Payout initiated before its completed-order document existed. Held in a
/// side table until the order write shows up, then merged and deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPayout {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub order_ref: String,
    pub service_id: String,
    pub payout_id: String,
    pub payout_status: String,
    #[serde(default)]
    pub payout_done: bool,
    pub created_at: DateTime,
}

impl PendingPayout {
    pub const COLLECTION: &'static str = "pending_payouts";
}

/// Audit record of a verified payout webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookLog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub source: String,
    pub event: String,
    pub payout_id: String,
    pub status: String,
    pub received_at: DateTime,
}

impl WebhookLog {
    pub const COLLECTION: &'static str = "webhook_logs";
}
