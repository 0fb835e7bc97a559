//! User registration and entry append use-cases.
//!
//! # Responsibility
//! - Create users and entries through the injected store.
//! - Resolve users for read paths and entry responses.
//!
//! # Invariants
//! - Appending an entry requires the referenced user to exist.
//! - A failed write read-back is logged, never returned as an error.

use crate::model::entry::{ExerciseEntry, NewEntry};
use crate::model::user::{User, UserId};
use crate::service::{ServiceError, ServiceResult};
use crate::store::Store;
use log::{error, info, warn};
use std::time::Instant;

/// Entry appended to a log together with its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEntry {
    pub user: User,
    pub entry: ExerciseEntry,
}

/// Service facade over one store handle.
pub struct ExerciseService<S: Store> {
    store: S,
}

impl<S: Store> ExerciseService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Registers a new user.
    ///
    /// # Errors
    /// - `Validation(EmptyUsername)` for a blank name; nothing is written.
    /// - `Store` when the insert fails.
    pub fn create_user(&self, username: impl Into<String>) -> ServiceResult<User> {
        let user = User::new(username)?;
        let started_at = Instant::now();

        self.store.insert_user(&user).inspect_err(|err| {
            error!(
                "event=user_create module=service status=error error_code=store_insert_failed error={err}"
            );
        })?;
        self.confirm_user_written(&user);

        info!(
            "event=user_create module=service status=ok user_id={} duration_ms={}",
            user.id,
            started_at.elapsed().as_millis()
        );
        Ok(user)
    }

    /// Lists every user in insertion order.
    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        let users = self.store.list_users()?;
        info!(
            "event=user_list module=service status=ok count={}",
            users.len()
        );
        Ok(users)
    }

    /// Resolves one user.
    ///
    /// # Errors
    /// - `UserNotFound` when no user has `id`.
    pub fn get_user(&self, id: UserId) -> ServiceResult<User> {
        self.store
            .find_user(id)?
            .ok_or(ServiceError::UserNotFound(id))
    }

    /// Appends one entry to an existing user's log.
    ///
    /// # Errors
    /// - `Validation` for blank description or non-positive duration.
    /// - `UserNotFound` when `input.user_id` is unknown.
    /// - `Store` when the insert fails.
    pub fn add_entry(&self, input: NewEntry) -> ServiceResult<LoggedEntry> {
        let entry = ExerciseEntry::new(input)?;
        let user = self.get_user(entry.user_id).inspect_err(|err| {
            warn!(
                "event=entry_create module=service status=error user_id={} error={err}",
                entry.user_id
            );
        })?;

        self.store.insert_entry(&entry).inspect_err(|err| {
            error!(
                "event=entry_create module=service status=error error_code=store_insert_failed user_id={} error={err}",
                entry.user_id
            );
        })?;
        self.confirm_entry_written(&entry);

        info!(
            "event=entry_create module=service status=ok user_id={} entry_id={} date_ms={}",
            user.id,
            entry.id,
            entry.date.epoch_ms()
        );
        Ok(LoggedEntry { user, entry })
    }

    fn confirm_user_written(&self, user: &User) {
        match self.store.find_user(user.id) {
            Ok(Some(_)) => {}
            Ok(None) => warn!(
                "event=write_confirm module=service status=error record=user id={} error_code=missing_after_insert",
                user.id
            ),
            Err(err) => warn!(
                "event=write_confirm module=service status=error record=user id={} error={err}",
                user.id
            ),
        }
    }

    fn confirm_entry_written(&self, entry: &ExerciseEntry) {
        match self.store.find_entry(entry.id) {
            Ok(Some(_)) => {}
            Ok(None) => warn!(
                "event=write_confirm module=service status=error record=entry id={} error_code=missing_after_insert",
                entry.id
            ),
            Err(err) => warn!(
                "event=write_confirm module=service status=error record=entry id={} error={err}",
                entry.id
            ),
        }
    }
}
