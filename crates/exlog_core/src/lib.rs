//! Core domain logic for the exercise log.
//! This crate owns every business invariant; binaries only wire it up.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::date::{EntryDate, ParseEntryDateError};
pub use model::entry::{EntryId, ExerciseEntry, NewEntry};
pub use model::user::{User, UserId};
pub use model::validation::ValidationError;
pub use service::exercise_service::{ExerciseService, LoggedEntry};
pub use service::log_query::{DateRange, EntryLimit, ExerciseLog, LogQuery};
pub use service::{ServiceError, ServiceResult};
pub use store::{EntryRangeFilter, SqliteStore, Store, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
