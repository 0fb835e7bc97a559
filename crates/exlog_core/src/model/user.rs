//! User domain model.
//!
//! # Invariants
//! - `id` is assigned once at construction and never changes.
//! - `username` is stored trimmed and is never empty.

use super::validation::ValidationError;
use serde::Serialize;
use uuid::Uuid;

/// Stable identifier of a registered user.
pub type UserId = Uuid;

/// Registered user; also the `{id, username}` projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl User {
    /// Creates a user with a freshly generated id.
    ///
    /// # Errors
    /// - `ValidationError::EmptyUsername` when `username` is blank.
    pub fn new(username: impl Into<String>) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), username)
    }

    /// Creates a user with a caller-provided id, e.g. when rehydrating rows.
    pub fn with_id(id: UserId, username: impl Into<String>) -> Result<Self, ValidationError> {
        let username = normalize_username(&username.into())?;
        Ok(Self { id, username })
    }
}

fn normalize_username(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    Ok(trimmed.to_string())
}
