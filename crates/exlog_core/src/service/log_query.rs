//! Range/limit queries over one user's exercise log.
//!
//! # Responsibility
//! - Normalize optional bounds and result caps into an explicit query.
//! - Resolve the user and fetch matching entries in date order.
//!
//! # Invariants
//! - Bounds are exclusive: an entry matches iff `from < date < to`.
//! - An absent bound or limit means "unbounded", never a sentinel value.
//! - Output order is date ascending, ties in insertion order.

use crate::model::date::EntryDate;
use crate::model::entry::ExerciseEntry;
use crate::model::user::{User, UserId};
use crate::model::validation::ValidationError;
use crate::service::exercise_service::ExerciseService;
use crate::service::ServiceResult;
use crate::store::{EntryRangeFilter, Store};
use log::info;
use std::time::Instant;

/// Cap on the number of entries a log query returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryLimit {
    #[default]
    Unbounded,
    AtMost(u32),
}

impl EntryLimit {
    /// Builds a cap from a caller-supplied count.
    ///
    /// # Errors
    /// - `InvalidLimit` for zero.
    pub fn at_most(count: u32) -> Result<Self, ValidationError> {
        if count == 0 {
            return Err(ValidationError::InvalidLimit(count.to_string()));
        }
        Ok(Self::AtMost(count))
    }

    fn as_option(self) -> Option<u32> {
        match self {
            Self::Unbounded => None,
            Self::AtMost(count) => Some(count),
        }
    }
}

/// Open date interval; `None` leaves a side unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<EntryDate>,
    pub to: Option<EntryDate>,
}

impl DateRange {
    /// Whether no instant can satisfy both bounds.
    pub fn is_empty(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from >= to)
    }
}

/// One `getLog` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogQuery {
    pub user_id: UserId,
    pub range: DateRange,
    pub limit: EntryLimit,
}

impl LogQuery {
    /// Query for every entry of `user_id`.
    pub fn all(user_id: UserId) -> Self {
        Self {
            user_id,
            range: DateRange::default(),
            limit: EntryLimit::Unbounded,
        }
    }
}

/// Resolved user with the entries that matched a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseLog {
    pub user: User,
    pub entries: Vec<ExerciseEntry>,
}

impl<S: Store> ExerciseService<S> {
    /// Returns `query.user_id`'s entries inside the query's open range.
    ///
    /// # Errors
    /// - `UserNotFound` when the user does not exist.
    /// - `Store` when the range read fails.
    pub fn get_log(&self, query: &LogQuery) -> ServiceResult<ExerciseLog> {
        let started_at = Instant::now();
        let user = self.get_user(query.user_id)?;

        let entries = if query.range.is_empty() {
            Vec::new()
        } else {
            self.store().find_entries(&EntryRangeFilter {
                user_id: user.id,
                gt: query.range.from,
                lt: query.range.to,
                limit: query.limit.as_option(),
            })?
        };

        info!(
            "event=log_query module=service status=ok user_id={} count={} duration_ms={}",
            user.id,
            entries.len(),
            started_at.elapsed().as_millis()
        );
        Ok(ExerciseLog { user, entries })
    }
}
