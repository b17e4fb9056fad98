//! User — account identity plus the gamification counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A registered account.
///
/// `total_points` only ever grows, and `current_streak` /
/// `last_activity_at` are mutated exclusively by
/// [`crate::score::update_streak`] — no other code path touches them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:          Uuid,
  pub email:            String,
  pub username:         String,
  /// Argon2 PHC string. Never serialised into responses.
  #[serde(skip_serializing, default)]
  pub password_hash:    String,
  pub total_points:     i64,
  pub current_streak:   u32,
  /// `None` until the first task completion.
  pub last_activity_at: Option<DateTime<Utc>>,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::TaskStore::add_user`].
/// The password arrives here already hashed; plaintext policy is the API
/// layer's concern.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub username:      String,
  pub password_hash: String,
}

impl NewUser {
  /// Trim and check the identity fields.
  pub fn validated(mut self) -> Result<Self> {
    self.email = self.email.trim().to_owned();
    self.username = self.username.trim().to_owned();

    if !self.email.contains('@') {
      return Err(Error::validation("email", "not a valid email address"));
    }
    let username_len = self.username.chars().count();
    if username_len < 3 {
      return Err(Error::validation(
        "username",
        "must be at least 3 characters",
      ));
    }
    if username_len > 50 {
      return Err(Error::validation(
        "username",
        "must be at most 50 characters",
      ));
    }

    Ok(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input(email: &str, username: &str) -> NewUser {
    NewUser {
      email:         email.into(),
      username:      username.into(),
      password_hash: "$argon2id$test".into(),
    }
  }

  #[test]
  fn accepts_reasonable_input_and_trims() {
    let user = input("  ada@example.com ", " ada ").validated().unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.username, "ada");
  }

  #[test]
  fn rejects_email_without_at_sign() {
    let err = input("not-an-email", "ada").validated().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "email", .. }));
  }

  #[test]
  fn rejects_short_and_long_usernames() {
    let err = input("a@b.c", "ab").validated().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "username", .. }));

    let err = input("a@b.c", &"x".repeat(51)).validated().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "username", .. }));
  }
}
