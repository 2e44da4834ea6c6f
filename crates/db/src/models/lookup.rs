use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Per-day booking load for a service, maintained by the booking flow and
/// read by the availability lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: String,
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub booked_count: u32,
    #[serde(default)]
    pub capacity: u32,
    pub updated_at: DateTime,
}

impl DailySummary {
    pub const COLLECTION: &'static str = "daily_summaries";
}

/// Published per-pet pricing for a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetPricing {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: String,
    pub pet_type: String,
    pub price_per_day: u32,
    pub updated_at: DateTime,
}

impl PetPricing {
    pub const COLLECTION: &'static str = "pet_pricing";
}
