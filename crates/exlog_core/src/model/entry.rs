//! Exercise entry domain model.
//!
//! # Responsibility
//! - Validate raw entry input into an immutable `ExerciseEntry`.
//! - Default the entry date to the creation instant.
//!
//! # Invariants
//! - `description` is trimmed and non-empty.
//! - `duration_minutes` is strictly positive.
//! - `user_id` is a lookup reference only; existence is checked by the
//!   service before persistence, not here.

use super::date::EntryDate;
use super::user::UserId;
use super::validation::ValidationError;
use serde::Serialize;
use uuid::Uuid;

/// Stable identifier of one exercise entry.
pub type EntryId = Uuid;

/// Unvalidated input for appending one entry to a user's log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub user_id: UserId,
    pub description: String,
    /// Whole minutes as supplied; checked for sign and range on construction.
    pub duration_minutes: i64,
    /// `None` means "now".
    pub date: Option<EntryDate>,
}

/// One persisted exercise log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub description: String,
    pub duration_minutes: u32,
    pub date: EntryDate,
}

impl ExerciseEntry {
    /// Validates `input` and assigns a fresh id.
    ///
    /// # Errors
    /// - `EmptyDescription` for a blank description.
    /// - `NonPositiveDuration` for zero or negative minutes.
    /// - `InvalidDuration` when minutes do not fit the stored range.
    pub fn new(input: NewEntry) -> Result<Self, ValidationError> {
        let description = input.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        if input.duration_minutes <= 0 {
            return Err(ValidationError::NonPositiveDuration(input.duration_minutes));
        }
        let duration_minutes = u32::try_from(input.duration_minutes)
            .map_err(|_| ValidationError::InvalidDuration(input.duration_minutes.to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            description: description.to_string(),
            duration_minutes,
            date: input.date.unwrap_or_else(EntryDate::now),
        })
    }
}
