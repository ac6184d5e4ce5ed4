//! Field Validation
//!
//! A `ValidationResult` maps every checked field to an error message, with
//! an empty message meaning the field is valid. Keeping the valid fields in
//! the map lets a form clear stale errors field by field.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Pattern used for email fields
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationResult {
    fields: BTreeMap<String, String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `name`; `None` means valid
    pub fn field(mut self, name: impl Into<String>, error: Option<String>) -> Self {
        self.fields.insert(name.into(), error.unwrap_or_default());
        self
    }

    /// Error message for `name`, if the field was checked and failed
    pub fn error(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|message| !message.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn is_valid(&self) -> bool {
        self.fields.values().all(|message| message.is_empty())
    }

    /// Failed fields and their messages, in field-name order
    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter(|(_, message)| !message.is_empty())
            .map(|(name, message)| (name.as_str(), message.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// One-line description of every failed field
    pub fn summary(&self) -> Option<String> {
        let parts: Vec<String> = self
            .errors()
            .map(|(name, message)| format!("{}: {}", name, message))
            .collect();
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}

// ========================
// Rules
// ========================

pub fn required(value: &str, message: &str) -> Option<String> {
    value.trim().is_empty().then(|| message.to_string())
}

pub fn required_some<T>(value: &Option<T>, message: &str) -> Option<String> {
    value.is_none().then(|| message.to_string())
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Email that may be left blank but must be well formed when given
pub fn optional_email(value: &str, message: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && !is_email(value)).then(|| message.to_string())
}

/// Amount that must be present and strictly positive
pub fn positive_amount(value: Option<f64>, required_message: &str, message: &str) -> Option<String> {
    match value {
        None => Some(required_message.to_string()),
        Some(amount) if !amount.is_finite() || amount <= 0.0 => Some(message.to_string()),
        Some(_) => None,
    }
}
