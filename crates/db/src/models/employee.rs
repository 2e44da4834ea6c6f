use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: String,
    pub employee_id: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime,
}

impl Employee {
    pub const COLLECTION: &'static str = "employees";
}

/// A task assigned to an employee by another member of the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: String,
    pub task_id: String,
    pub assigned_to: String,
    pub created_by: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime,
}

impl Task {
    pub const COLLECTION: &'static str = "employee_tasks";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSubmission {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: String,
    pub task_id: String,
    pub assigned_to: String,
    pub submitted_at: DateTime,
}

impl TaskSubmission {
    pub const COLLECTION: &'static str = "task_submissions";
}
