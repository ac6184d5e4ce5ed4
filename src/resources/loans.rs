//! Loan Applications

use serde::Serialize;

use crate::domain::{LoanApplication, LoanDraft, ProvisionalIds};
use crate::identity::User;
use crate::resource::Resource;
use crate::validation::{positive_amount, required, required_some, ValidationResult};

/// Longest repayment period the API accepts
pub const MAX_TENURE_MONTHS: u32 = 120;

pub struct Loans;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanPayload {
    pub user_id: String,
    #[serde(flatten)]
    pub draft: LoanDraft,
}

impl Resource for Loans {
    type Item = LoanApplication;
    type Draft = LoanDraft;
    type Patch = LoanDraft;
    type CreateRequest = LoanPayload;
    type Created = LoanApplication;

    const NAME: &'static str = "loan application";
    const PATH: &'static str = "loans";

    fn validate(draft: &LoanDraft) -> ValidationResult {
        let tenure = required_some(&draft.tenure_months, "Tenure is required").or_else(|| {
            draft
                .tenure_months
                .filter(|months| *months == 0 || *months > MAX_TENURE_MONTHS)
                .map(|_| format!("Tenure must be between 1 and {} months", MAX_TENURE_MONTHS))
        });

        ValidationResult::new()
            .field("loan_type", required(&draft.loan_type, "Loan type is required"))
            .field(
                "amount",
                positive_amount(draft.amount, "Amount is required", "Amount must be greater than zero"),
            )
            .field("tenure_months", tenure)
            .field("purpose", required(&draft.purpose, "Purpose is required"))
    }

    fn validate_patch(patch: &LoanDraft) -> ValidationResult {
        Self::validate(patch)
    }

    fn provisional_items(draft: &LoanDraft, owner: &User, ids: &ProvisionalIds) -> Vec<LoanApplication> {
        vec![LoanApplication::from_draft(ids.next_id(), &owner.id, draft)]
    }

    fn create_request(draft: &LoanDraft, owner: &User, _provisional: &[LoanApplication]) -> LoanPayload {
        LoanPayload {
            user_id: owner.id.clone(),
            draft: draft.clone(),
        }
    }

    fn confirmed_items(created: LoanApplication) -> Vec<LoanApplication> {
        vec![created]
    }
}
