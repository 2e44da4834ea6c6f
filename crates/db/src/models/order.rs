use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::booking::WaSendState;

/// A finished boarding stay, written when the end PIN is redeemed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedOrder {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: String,
    pub order_ref: String,
    pub user_name: Option<String>,
    pub phone_number: Option<String>,
    pub shop_name: Option<String>,
    #[serde(default)]
    pub is_end_pin_used: bool,
    /// State of the "order done" WhatsApp message.
    #[serde(default)]
    pub wa_order_done: WaSendState,
    /// Attached once the payout for this order is known.
    pub payout: Option<PayoutInfo>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl CompletedOrder {
    pub const COLLECTION: &'static str = "completed_orders";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutInfo {
    pub payout_id: String,
    pub payout_status: String,
    #[serde(default)]
    pub payout_done: bool,
    pub created_at: DateTime,
    pub updated_at: Option<DateTime>,
}
