//! Loan Application Entity

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::status::ApplicationStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: String,
    pub user_id: String,
    pub loan_type: String,
    pub amount: f64,
    /// Repayment period
    pub tenure_months: u32,
    pub purpose: String,
    #[serde(default)]
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanDraft {
    pub loan_type: String,
    pub amount: Option<f64>,
    pub tenure_months: Option<u32>,
    pub purpose: String,
}

impl LoanApplication {
    pub fn from_draft(id: String, user_id: &str, draft: &LoanDraft) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            loan_type: draft.loan_type.trim().to_string(),
            amount: draft.amount.unwrap_or_default(),
            tenure_months: draft.tenure_months.unwrap_or_default(),
            purpose: draft.purpose.trim().to_string(),
            status: ApplicationStatus::Pending,
        }
    }
}

impl Entity for LoanApplication {
    fn id(&self) -> &str {
        &self.id
    }
}
