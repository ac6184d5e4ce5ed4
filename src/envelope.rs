//! Wire Envelope and Failure Taxonomy
//!
//! Every API response body is `{success, message, data?}`. Transport-level
//! faults never produce an envelope; they surface as `TransportError`.

use serde::{Deserialize, Serialize};

use crate::validation::ValidationResult;

/// Message shown when a failure carries nothing better
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Uniform response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// The request never produced an envelope
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx answer; `message` is the body's `message` field when present
    #[error("{}", .message.as_deref().unwrap_or("request failed"))]
    Status { status: u16, message: Option<String> },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("not signed in")]
    Unauthenticated,
    #[error("{0} is not supported by this resource")]
    Unsupported(&'static str),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Message supplied by the server, if it sent one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            TransportError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Everything the store reports to the user
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Failure {
    /// Local field validation failed; nothing was sent
    #[error("Please correct the highlighted fields")]
    Validation(ValidationResult),
    /// The server processed the request and declined it
    #[error("{message}")]
    Rejected { message: String },
    /// The request did not complete
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Failure {
    pub fn rejected(message: impl Into<String>) -> Self {
        Failure::Rejected {
            message: message.into(),
        }
    }

    /// Headline for the notification
    pub fn message(&self) -> String {
        let message = match self {
            Failure::Transport(err) => err
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string()),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        }
    }

    /// Secondary line for the notification
    pub fn detail(&self) -> Option<String> {
        match self {
            Failure::Validation(result) => result.summary(),
            Failure::Transport(TransportError::Status { status, .. }) => {
                Some(format!("HTTP {}", status))
            }
            _ => None,
        }
    }
}
