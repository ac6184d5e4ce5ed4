//! Domain Layer
//!
//! Records managed by the resource stores, and the identity rules they share.
//! This layer has no I/O (only serde and chrono).

mod dependent;
mod entity;
mod grant;
mod loan;
mod status;

pub use dependent::{Dependent, DependentDraft};
pub use entity::{is_provisional, Entity, ProvisionalIds, PROVISIONAL_PREFIX};
pub use grant::{Grant, GrantDraft, GrantLine};
pub use loan::{LoanApplication, LoanDraft};
pub use status::ApplicationStatus;
