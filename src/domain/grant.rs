//! Grant Entity
//!
//! Welfare grant requests. Several grants can be requested in one batch.

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::status::ApplicationStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    pub user_id: String,
    /// Medical, education, bereavement, ...
    pub grant_type: String,
    pub amount: f64,
    pub reason: String,
    #[serde(default)]
    pub status: ApplicationStatus,
}

/// One line of a grant request form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantLine {
    pub grant_type: String,
    pub amount: Option<f64>,
    pub reason: String,
}

/// A batch of grant lines submitted together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantDraft {
    pub items: Vec<GrantLine>,
}

impl Grant {
    pub fn from_line(id: String, user_id: &str, line: &GrantLine) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            grant_type: line.grant_type.trim().to_string(),
            amount: line.amount.unwrap_or_default(),
            reason: line.reason.trim().to_string(),
            status: ApplicationStatus::Pending,
        }
    }
}

impl Entity for Grant {
    fn id(&self) -> &str {
        &self.id
    }
}
