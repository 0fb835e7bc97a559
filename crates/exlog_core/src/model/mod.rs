//! Entity model for users and their exercise log.
//!
//! # Responsibility
//! - Define the `User` and `ExerciseEntry` record shapes.
//! - Own validation and normalization rules applied before persistence.
//!
//! # Invariants
//! - Every record is identified by a stable, never-reused UUID.
//! - Records are immutable once constructed; there is no update path.

pub mod date;
pub mod entry;
pub mod user;
pub mod validation;
