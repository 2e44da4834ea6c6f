use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A pet-owner account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppUser {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Identity-directory uid.
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub fcm_token: Option<String>,
    #[serde(default)]
    pub account_status: AccountStatus,
    /// Set when the account transitions to locked; drives the cleanup sweep.
    pub locked_at: Option<DateTime>,
    pub last_login: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl AppUser {
    pub const COLLECTION: &'static str = "users";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Locked,
}
