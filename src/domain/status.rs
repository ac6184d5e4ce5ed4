//! Review status shared by loans and grants

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Disbursed,
    /// Any status this client does not know about yet
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_does_not_fail_decoding() {
        let status: ApplicationStatus = serde_json::from_str(r#""escalated""#).unwrap();
        assert_eq!(status, ApplicationStatus::Unknown);
        let status: ApplicationStatus = serde_json::from_str(r#""approved""#).unwrap();
        assert_eq!(status, ApplicationStatus::Approved);
    }
}
