//! Grants
//!
//! Batch creation: every line of the form becomes one provisional grant and
//! the whole batch is posted as `{user_id, items}`. The server answers with
//! the created grants in request order. Updates edit one grant and send a
//! single line.

use serde::Serialize;

use crate::domain::{Grant, GrantDraft, GrantLine, ProvisionalIds};
use crate::identity::User;
use crate::resource::Resource;
use crate::validation::{positive_amount, required, ValidationResult};

pub struct Grants;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantBatch {
    pub user_id: String,
    pub items: Vec<Grant>,
}

impl Resource for Grants {
    type Item = Grant;
    type Draft = GrantDraft;
    type Patch = GrantLine;
    type CreateRequest = GrantBatch;
    type Created = Vec<Grant>;

    const NAME: &'static str = "grant";
    const PATH: &'static str = "grants";

    fn validate(draft: &GrantDraft) -> ValidationResult {
        let empty = draft.items.is_empty().then(|| "Add at least one grant".to_string());
        let result = ValidationResult::new().field("items", empty);

        draft
            .items
            .iter()
            .enumerate()
            .fold(result, |result, (i, line)| check_line(result, &format!("items.{}.", i), line))
    }

    fn validate_patch(line: &GrantLine) -> ValidationResult {
        check_line(ValidationResult::new(), "", line)
    }

    fn provisional_items(draft: &GrantDraft, owner: &User, ids: &ProvisionalIds) -> Vec<Grant> {
        draft
            .items
            .iter()
            .map(|line| Grant::from_line(ids.next_id(), &owner.id, line))
            .collect()
    }

    fn create_request(_draft: &GrantDraft, owner: &User, provisional: &[Grant]) -> GrantBatch {
        GrantBatch {
            user_id: owner.id.clone(),
            items: provisional.to_vec(),
        }
    }

    fn confirmed_items(created: Vec<Grant>) -> Vec<Grant> {
        created
    }
}

/// Field errors for one line, keyed `<prefix>grant_type` and so on
fn check_line(result: ValidationResult, prefix: &str, line: &GrantLine) -> ValidationResult {
    result
        .field(
            format!("{}grant_type", prefix),
            required(&line.grant_type, "Grant type is required"),
        )
        .field(
            format!("{}amount", prefix),
            positive_amount(line.amount, "Amount is required", "Amount must be greater than zero"),
        )
        .field(format!("{}reason", prefix), required(&line.reason, "Reason is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(grant_type: &str, amount: Option<f64>) -> GrantLine {
        GrantLine {
            grant_type: grant_type.to_string(),
            amount,
            reason: "School fees".to_string(),
        }
    }

    #[test]
    fn test_empty_batch_is_invalid() {
        let result = Grants::validate(&GrantDraft::default());
        assert_eq!(result.error("items"), Some("Add at least one grant"));
    }

    #[test]
    fn test_each_line_is_checked() {
        let draft = GrantDraft {
            items: vec![line("education", Some(200.0)), line("", Some(-5.0))],
        };
        let result = Grants::validate(&draft);

        assert_eq!(result.error("items.0.amount"), None);
        assert_eq!(result.error("items.1.grant_type"), Some("Grant type is required"));
        assert_eq!(result.error("items.1.amount"), Some("Amount must be greater than zero"));
        assert!(!result.is_valid());
    }

    #[test]
    fn test_single_grant_update_is_checked_without_batch() {
        assert!(Grants::validate_patch(&line("education", Some(120.0))).is_valid());

        let result = Grants::validate_patch(&line("", None));
        assert!(!result.contains("items"));
        assert_eq!(result.error("grant_type"), Some("Grant type is required"));
        assert_eq!(result.error("amount"), Some("Amount is required"));
    }

    #[test]
    fn test_batch_envelope_carries_provisional_items() {
        let owner = User::new("emp-5");
        let ids = ProvisionalIds::new();
        let draft = GrantDraft {
            items: vec![line("education", Some(200.0)), line("medical", Some(80.0))],
        };

        let provisional = Grants::provisional_items(&draft, &owner, &ids);
        let batch = Grants::create_request(&draft, &owner, &provisional);

        assert_eq!(provisional.len(), 2);
        assert_ne!(provisional[0].id, provisional[1].id);
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["user_id"], "emp-5");
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
        assert_eq!(json["items"][1]["grant_type"], "medical");
        assert_eq!(json["items"][0]["status"], "pending");
    }
}
