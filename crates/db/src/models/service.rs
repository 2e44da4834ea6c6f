use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A boarding service provider's profile document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProfile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Stable external identifier used across collections and APIs.
    pub service_id: String,
    pub shop_name: Option<String>,
    /// Contact address for operational notifications.
    pub owner_email: Option<String>,
    /// Address the account signs in with.
    pub login_email: Option<String>,
    /// Owning user account.
    pub shop_user_id: Option<String>,
    #[serde(default)]
    pub admin_approved: bool,
    /// Whether the shop is listed in the user application.
    #[serde(default)]
    pub display: bool,
    #[serde(default)]
    pub notification_email_verified: bool,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    /// Boarding capacity per day, used by the availability lookup.
    pub max_pets_allowed: Option<u32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl ServiceProfile {
    pub const COLLECTION: &'static str = "boarding_services";
}

/// A registered push destination for a service. One document per device;
/// `employee_id` scopes employee-targeted notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushContact {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: String,
    pub employee_id: Option<String>,
    pub fcm_token: Option<String>,
    pub created_at: DateTime,
}

impl PushContact {
    pub const COLLECTION: &'static str = "push_contacts";
}
