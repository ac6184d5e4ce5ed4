//! Dependent Entity
//!
//! A family member registered against an employee.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// A dependent as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependent {
    pub id: String,
    /// Owning employee (stamped from the signed-in user)
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Spouse, child, parent, ...
    pub relationship: String,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Form input for a new or edited dependent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependentDraft {
    pub first_name: String,
    pub last_name: String,
    pub relationship: String,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl Dependent {
    /// Build a record from form input, used for the provisional entry
    pub fn from_draft(id: String, employee_id: &str, draft: &DependentDraft) -> Self {
        Self {
            id,
            employee_id: employee_id.to_string(),
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            relationship: draft.relationship.trim().to_string(),
            date_of_birth: draft.date_of_birth,
            email: non_empty(&draft.email),
            phone: non_empty(&draft.phone),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl Entity for Dependent {
    fn id(&self) -> &str {
        &self.id
    }
}
