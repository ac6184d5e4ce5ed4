//! Dependents
//!
//! Single-record creation; the create body is the form payload stamped with
//! the owning `employee_id`.

use chrono::Local;
use serde::Serialize;

use crate::domain::{Dependent, DependentDraft, ProvisionalIds};
use crate::identity::User;
use crate::resource::Resource;
use crate::validation::{optional_email, required, ValidationResult};

pub struct Dependents;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependentPayload {
    pub employee_id: String,
    #[serde(flatten)]
    pub draft: DependentDraft,
}

impl Resource for Dependents {
    type Item = Dependent;
    type Draft = DependentDraft;
    type Patch = DependentDraft;
    type CreateRequest = DependentPayload;
    type Created = Dependent;

    const NAME: &'static str = "dependent";
    const PATH: &'static str = "dependents";

    fn validate(draft: &DependentDraft) -> ValidationResult {
        let today = Local::now().date_naive();
        let date_of_birth = match draft.date_of_birth {
            None => Some("Date of birth is required".to_string()),
            Some(date) if date > today => Some("Date of birth cannot be in the future".to_string()),
            Some(_) => None,
        };

        ValidationResult::new()
            .field("first_name", required(&draft.first_name, "First name is required"))
            .field("last_name", required(&draft.last_name, "Last name is required"))
            .field("relationship", required(&draft.relationship, "Relationship is required"))
            .field("date_of_birth", date_of_birth)
            .field("email", optional_email(&draft.email, "Enter a valid email address"))
    }

    fn validate_patch(patch: &DependentDraft) -> ValidationResult {
        Self::validate(patch)
    }

    fn provisional_items(draft: &DependentDraft, owner: &User, ids: &ProvisionalIds) -> Vec<Dependent> {
        vec![Dependent::from_draft(ids.next_id(), &owner.id, draft)]
    }

    fn create_request(draft: &DependentDraft, owner: &User, _provisional: &[Dependent]) -> DependentPayload {
        DependentPayload {
            employee_id: owner.id.clone(),
            draft: draft.clone(),
        }
    }

    fn confirmed_items(created: Dependent) -> Vec<Dependent> {
        vec![created]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn valid_draft() -> DependentDraft {
        DependentDraft {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            relationship: "child".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2015, 12, 10),
            email: String::new(),
            phone: String::new(),
        }
    }

    #[test]
    fn test_missing_first_name() {
        let draft = DependentDraft { first_name: String::new(), ..valid_draft() };
        let result = Dependents::validate(&draft);

        assert_eq!(result.error("first_name"), Some("First name is required"));
        assert!(!result.is_valid());
        for field in ["first_name", "last_name", "relationship", "date_of_birth", "email"] {
            assert!(result.contains(field), "{} should be reported", field);
        }
    }

    #[test]
    fn test_valid_draft() {
        assert!(Dependents::validate(&valid_draft()).is_valid());
    }

    #[test]
    fn test_future_birth_date_and_bad_email() {
        let draft = DependentDraft {
            date_of_birth: Some(Local::now().date_naive() + Duration::days(2)),
            email: "not-an-email".to_string(),
            ..valid_draft()
        };
        let result = Dependents::validate(&draft);
        assert_eq!(result.error("date_of_birth"), Some("Date of birth cannot be in the future"));
        assert_eq!(result.error("email"), Some("Enter a valid email address"));
    }

    #[test]
    fn test_request_is_stamped_with_employee() {
        let owner = User::new("emp-3");
        let ids = ProvisionalIds::new();
        let provisional = Dependents::provisional_items(&valid_draft(), &owner, &ids);
        let request = Dependents::create_request(&valid_draft(), &owner, &provisional);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["employee_id"], "emp-3");
        assert_eq!(json["first_name"], "Ada");
        assert!(json.get("id").is_none());
        assert_eq!(provisional[0].employee_id, "emp-3");
    }
}
