//! Error taxonomy for the feedback workflow.
//!
//! Validation and rate-limit errors are user-facing; delivery and storage
//! errors carry diagnostic detail that is logged, never shown verbatim.

use serde::{Deserialize, Serialize};

/// Inline form validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ValidationError {
    #[error("Please select a feedback category")]
    MissingCategory,

    #[error("Please enter your feedback")]
    EmptyText,

    #[error("Feedback must be {max} characters or fewer")]
    TooLong { max: usize },
}

/// Submission blocked by the session rate limit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Rate limit exceeded. Maximum {max_requests} submissions per {window_minutes} minutes. Please try again later."
)]
pub struct RateLimitError {
    pub max_requests: u32,
    pub window_minutes: u64,
}

/// The outbound send call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("delivery timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl DeliveryError {
    /// Message shown to the user; the underlying cause stays in the logs.
    pub fn user_message(&self) -> &'static str {
        "Failed to send feedback. Please try again."
    }
}

/// Startup configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing outbound send credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Local draft storage failure. Never fatal to the workflow.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed draft storage: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A category identifier outside the fixed set. Indicates a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown feedback category: {0}")]
pub struct UnknownCategory(pub String);
