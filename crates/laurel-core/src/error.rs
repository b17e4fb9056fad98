//! Error types for `laurel-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("task not found: {0}")]
  TaskNotFound(Uuid),

  #[error("task {0} is already completed")]
  AlreadyCompleted(Uuid),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("username already taken: {0}")]
  UsernameTaken(String),

  #[error("invalid {field}: {reason}")]
  Validation {
    field:  &'static str,
    reason: String,
  },

  /// A backend failure surfaced through the [`crate::store::TaskStore`]
  /// abstraction. Always propagated, never swallowed.
  #[error("storage error: {0}")]
  Storage(String),
}

impl Error {
  pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
    Self::Validation { field, reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
