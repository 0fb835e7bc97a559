//! Exercise log use-case services.
//!
//! # Responsibility
//! - Orchestrate entity validation and store calls into request-level APIs.
//! - Evaluate range/limit log queries over one user's entries.
//!
//! # Invariants
//! - Validation failures are reported before any store call.
//! - Store failures are surfaced unchanged and never retried here.

use crate::model::user::UserId;
use crate::model::validation::ValidationError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod exercise_service;
pub mod log_query;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of one service operation.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    /// Referenced user does not exist.
    UserNotFound(UserId),
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::UserNotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
