//! Resource Types
//!
//! Per-resource mapping for the optimistic store, organized by domain.

mod dependents;
mod grants;
mod loans;

pub use dependents::{DependentPayload, Dependents};
pub use grants::{GrantBatch, Grants};
pub use loans::{LoanPayload, Loans, MAX_TENURE_MONTHS};
