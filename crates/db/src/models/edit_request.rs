use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An admin-reviewed request to edit a service profile. The owner is
/// notified when `handled` flips to true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: String,
    pub request_id: String,
    #[serde(default)]
    pub handled: bool,
    #[serde(default)]
    pub approved_fields: Vec<String>,
    /// Rejected field name -> rejection reason.
    #[serde(default)]
    pub rejected_fields: BTreeMap<String, String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl EditRequest {
    pub const COLLECTION: &'static str = "profile_edit_requests";
}
