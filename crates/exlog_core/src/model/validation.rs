//! Validation failures for entity construction and query input.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input rejected before any store call.
///
/// One variant per offending field; `Display` yields the message surfaced to
/// transport callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyUsername,
    MissingUserId,
    InvalidUserId(String),
    EmptyDescription,
    MissingDuration,
    InvalidDuration(String),
    NonPositiveDuration(i64),
    InvalidDate { field: &'static str, value: String },
    InvalidLimit(String),
    /// Request body does not match the expected shape at all.
    MalformedRequest(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username is required"),
            Self::MissingUserId => write!(f, "userId is required"),
            Self::InvalidUserId(value) => write!(f, "userId `{value}` is not a valid id"),
            Self::EmptyDescription => write!(f, "description is required"),
            Self::MissingDuration => write!(f, "durationMinutes is required"),
            Self::InvalidDuration(value) => write!(
                f,
                "durationMinutes must be a whole number of minutes, got `{value}`"
            ),
            Self::NonPositiveDuration(value) => {
                write!(f, "durationMinutes must be positive, got {value}")
            }
            Self::InvalidDate { field, value } => write!(f, "{field} `{value}` is not a valid date"),
            Self::InvalidLimit(value) => {
                write!(f, "limit must be a positive integer, got `{value}`")
            }
            Self::MalformedRequest(message) => write!(f, "malformed request: {message}"),
        }
    }
}

impl Error for ValidationError {}
