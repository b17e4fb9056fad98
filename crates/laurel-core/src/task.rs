//! Task — the unit of study work users complete for points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Allowed range for a task's difficulty weight.
pub const WEIGHT_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// A study task owned by one user.
///
/// Completion is a one-way transition: once `is_completed` is true,
/// `completed_at` and `points_awarded` are frozen. Deleting a task later
/// has no effect on points or badges already earned from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
  pub task_id:        Uuid,
  pub owner_id:       Uuid,
  pub title:          String,
  pub description:    Option<String>,
  /// Free-text study subject, e.g. "Calculus II".
  pub subject:        String,
  /// Difficulty weight in [`WEIGHT_RANGE`]; fixed at creation.
  pub weight:         u8,
  pub due_date:       Option<DateTime<Utc>>,
  pub is_completed:   bool,
  /// Set exactly once, by the completion pipeline.
  pub completed_at:   Option<DateTime<Utc>>,
  pub points_awarded: i64,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::TaskStore::add_task`].
#[derive(Debug, Clone)]
pub struct NewTask {
  pub owner_id:    Uuid,
  pub title:       String,
  pub description: Option<String>,
  pub subject:     String,
  pub weight:      u8,
  pub due_date:    Option<DateTime<Utc>>,
}

impl NewTask {
  /// Trim the text fields and check the creation rules.
  pub fn validated(mut self) -> Result<Self> {
    self.title = self.title.trim().to_owned();
    self.subject = self.subject.trim().to_owned();
    self.description = self
      .description
      .map(|d| d.trim().to_owned())
      .filter(|d| !d.is_empty());

    let title_len = self.title.chars().count();
    if title_len < 3 {
      return Err(Error::validation("title", "must be at least 3 characters"));
    }
    if title_len > 200 {
      return Err(Error::validation("title", "must be at most 200 characters"));
    }

    let subject_len = self.subject.chars().count();
    if subject_len < 2 {
      return Err(Error::validation(
        "subject",
        "must be at least 2 characters",
      ));
    }
    if subject_len > 100 {
      return Err(Error::validation(
        "subject",
        "must be at most 100 characters",
      ));
    }

    if let Some(description) = &self.description
      && description.chars().count() > 1000
    {
      return Err(Error::validation(
        "description",
        "must be at most 1000 characters",
      ));
    }

    if !WEIGHT_RANGE.contains(&self.weight) {
      return Err(Error::validation("weight", "must be between 1 and 10"));
    }

    Ok(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input() -> NewTask {
    NewTask {
      owner_id:    Uuid::new_v4(),
      title:       "Review chapter 4".into(),
      description: None,
      subject:     "Linear Algebra".into(),
      weight:      3,
      due_date:    None,
    }
  }

  #[test]
  fn accepts_reasonable_input() {
    assert!(input().validated().is_ok());
  }

  #[test]
  fn trims_and_drops_empty_description() {
    let task = NewTask {
      title: "  Review chapter 4  ".into(),
      description: Some("   ".into()),
      ..input()
    }
    .validated()
    .unwrap();
    assert_eq!(task.title, "Review chapter 4");
    assert!(task.description.is_none());
  }

  #[test]
  fn rejects_out_of_range_weight() {
    for weight in [0, 11] {
      let err = NewTask { weight, ..input() }.validated().unwrap_err();
      assert!(matches!(err, Error::Validation { field: "weight", .. }));
    }
  }

  #[test]
  fn rejects_short_title_and_subject() {
    let err = NewTask { title: "ab".into(), ..input() }
      .validated()
      .unwrap_err();
    assert!(matches!(err, Error::Validation { field: "title", .. }));

    let err = NewTask { subject: "x".into(), ..input() }
      .validated()
      .unwrap_err();
    assert!(matches!(err, Error::Validation { field: "subject", .. }));
  }

  #[test]
  fn rejects_oversized_description() {
    let err = NewTask { description: Some("d".repeat(1001)), ..input() }
      .validated()
      .unwrap_err();
    assert!(matches!(
      err,
      Error::Validation { field: "description", .. }
    ));
  }
}
