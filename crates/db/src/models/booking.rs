use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A boarding booking request under a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: String,
    /// Human-facing booking reference shown in messages.
    pub booking_ref: String,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    /// WhatsApp-capable number in international format.
    pub phone_number: Option<String>,
    #[serde(default)]
    pub pet_names: Vec<String>,
    #[serde(default)]
    pub selected_dates: Vec<DateTime>,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(default)]
    pub sp_confirmation: bool,
    pub rejection_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    /// Dates removed by a partial cancellation, if any.
    #[serde(default)]
    pub cancelled_dates: Vec<DateTime>,
    pub drop_time: Option<String>,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub shop_name: Option<String>,
    /// Durable state of the provider-confirmation WhatsApp send.
    #[serde(default)]
    pub wa_confirmation: WaSendState,
    /// Durable state of the booking-confirmation WhatsApp send to the user.
    #[serde(default)]
    pub wa_user_confirmation: WaSendState,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Booking {
    pub const COLLECTION: &'static str = "booking_requests";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    SpCancellation,
    UserCancellation,
}

/// Sent/in-progress flags recorded next to the document a WhatsApp message
/// is about. `in_progress` narrows the window for concurrent redeliveries;
/// `sent` is the durable idempotency signal.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WaSendState {
    #[serde(default)]
    pub sent: bool,
    #[serde(default)]
    pub in_progress: bool,
    #[serde(default)]
    pub failed: bool,
    pub failure_reason: Option<String>,
    pub sent_at: Option<DateTime>,
    pub last_attempt_at: Option<DateTime>,
}
