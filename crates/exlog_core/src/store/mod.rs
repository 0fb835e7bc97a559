//! Store contract for users and exercise entries.
//!
//! # Responsibility
//! - Define the minimal insert / find-by-id / find-all / find-range surface
//!   the services depend on.
//! - Keep storage engine details out of the entity and query layers.
//!
//! # Invariants
//! - Inserts never assign or rewrite ids; records arrive fully constructed.
//! - `find_entries` results are sorted by entry date ascending with ties in
//!   insertion order, and never exceed the filter's limit.
//! - The store owns its concurrency control; callers hold no locks.

use crate::db::DbError;
use crate::model::date::EntryDate;
use crate::model::entry::{EntryId, ExerciseEntry};
use crate::model::user::{User, UserId};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite;

pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failure surfaced by a store implementation.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Connection was opened without the store's tables.
    MissingRequiredTable(&'static str),
    /// A persisted row no longer satisfies the entity model.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "store table `{table}` is missing; was the database migrated?")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingRequiredTable(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Range filter over one user's entries.
///
/// Bounds are exclusive on both sides; `None` leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRangeFilter {
    pub user_id: UserId,
    /// Keep entries strictly after this instant.
    pub gt: Option<EntryDate>,
    /// Keep entries strictly before this instant.
    pub lt: Option<EntryDate>,
    /// Maximum rows; `None` returns every match.
    pub limit: Option<u32>,
}

impl EntryRangeFilter {
    /// Unbounded filter over every entry of `user_id`.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            gt: None,
            lt: None,
            limit: None,
        }
    }
}

/// Persistence contract required by the exercise services.
pub trait Store {
    fn insert_user(&self, user: &User) -> StoreResult<UserId>;
    fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;
    /// All users in insertion order.
    fn list_users(&self) -> StoreResult<Vec<User>>;
    fn insert_entry(&self, entry: &ExerciseEntry) -> StoreResult<EntryId>;
    fn find_entry(&self, id: EntryId) -> StoreResult<Option<ExerciseEntry>>;
    fn find_entries(&self, filter: &EntryRangeFilter) -> StoreResult<Vec<ExerciseEntry>>;
}
