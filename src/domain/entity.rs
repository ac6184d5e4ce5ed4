//! Domain Layer - Core Entity Trait
//!
//! Every record held by a store has a string identity. Until the server
//! confirms a record it carries a provisional identity generated here.

use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix that marks an identity as client-generated
pub const PROVISIONAL_PREFIX: &str = "temp-";

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// Returns the entity's identity (server-assigned or provisional)
    fn id(&self) -> &str;

    /// True while the entity has not been confirmed by the server
    fn is_provisional(&self) -> bool {
        is_provisional(self.id())
    }
}

pub fn is_provisional(id: &str) -> bool {
    id.starts_with(PROVISIONAL_PREFIX)
}

/// Generates provisional identities for one store instance.
///
/// Ids look like `temp-<unix millis>-<n>`. The counter makes them unique for
/// the lifetime of the generator even when two calls land in the same
/// millisecond.
#[derive(Debug, Default)]
pub struct ProvisionalIds {
    counter: AtomicU64,
}

impl ProvisionalIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}{}-{}",
            PROVISIONAL_PREFIX,
            chrono::Utc::now().timestamp_millis(),
            n
        )
    }
}
