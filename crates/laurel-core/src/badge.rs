//! Badge catalog types and the award evaluator.
//!
//! The catalog is seeded once at process start and read-only afterwards.
//! Award records are written only by the completion pipeline, after the
//! evaluator has consulted the set of badges the user already owns.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::User;

// ─── Trigger ─────────────────────────────────────────────────────────────────

/// The single condition that earns a badge. Exactly one per badge, so a
/// badge can never match twice in one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "threshold", rename_all = "snake_case")]
pub enum BadgeTrigger {
  /// Earned once `total_points` reaches the threshold.
  Points(i64),
  /// Earned once the count of completed tasks reaches the threshold.
  TaskCount(u32),
  /// Earned once the daily streak reaches the threshold.
  StreakDays(u32),
}

impl BadgeTrigger {
  /// The discriminant string stored in the `trigger_kind` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Points(_) => "points",
      Self::TaskCount(_) => "task_count",
      Self::StreakDays(_) => "streak_days",
    }
  }

  /// Whether the user's stats satisfy this trigger. A zero threshold is a
  /// badge that can never be earned, not an error.
  fn is_met(&self, user: &User, completed_tasks: u32) -> bool {
    match *self {
      Self::Points(points) => points > 0 && user.total_points >= points,
      Self::TaskCount(count) => count > 0 && completed_tasks >= count,
      Self::StreakDays(days) => days > 0 && user.current_streak >= days,
    }
  }
}

// ─── Catalog types ───────────────────────────────────────────────────────────

/// One catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
  pub badge_id:    Uuid,
  pub name:        String,
  pub description: String,
  pub icon:        String,
  pub trigger:     BadgeTrigger,
}

/// Catalog entry used for idempotent seeding; the store assigns the UUID.
#[derive(Debug, Clone, Copy)]
pub struct BadgeSeed {
  pub name:        &'static str,
  pub description: &'static str,
  pub icon:        &'static str,
  pub trigger:     BadgeTrigger,
}

/// A badge joined with one user's award record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardedBadge {
  pub badge:     Badge,
  pub earned_at: DateTime<Utc>,
}

/// The badges every fresh deployment starts with.
pub fn default_catalog() -> Vec<BadgeSeed> {
  vec![
    BadgeSeed {
      name:        "First Task",
      description: "Completed your first task",
      icon:        "🎯",
      trigger:     BadgeTrigger::TaskCount(1),
    },
    BadgeSeed {
      name:        "Streak Starter",
      description: "Kept a 3-day streak",
      icon:        "🔥",
      trigger:     BadgeTrigger::StreakDays(3),
    },
    BadgeSeed {
      name:        "Scholar",
      description: "Completed 10 tasks",
      icon:        "📚",
      trigger:     BadgeTrigger::TaskCount(10),
    },
    BadgeSeed {
      name:        "Dedicated",
      description: "Accumulated 100 points",
      icon:        "⭐",
      trigger:     BadgeTrigger::Points(100),
    },
    BadgeSeed {
      name:        "Streak Master",
      description: "Kept a 7-day streak",
      icon:        "🏆",
      trigger:     BadgeTrigger::StreakDays(7),
    },
    BadgeSeed {
      name:        "Century",
      description: "Completed 100 tasks",
      icon:        "💯",
      trigger:     BadgeTrigger::TaskCount(100),
    },
    BadgeSeed {
      name:        "Millennium",
      description: "Accumulated 1000 points",
      icon:        "💎",
      trigger:     BadgeTrigger::Points(1000),
    },
  ]
}

// ─── Evaluator ───────────────────────────────────────────────────────────────

/// One pass over the catalog: the badges the user newly qualifies for, in
/// catalog order.
///
/// `owned` is the set of badge IDs already awarded — badges in it are never
/// returned, which is what makes repeat evaluation idempotent.
/// `completed_tasks` must be the authoritative count at evaluation time,
/// including the completion being processed.
pub fn newly_earned(
  user: &User,
  catalog: &[Badge],
  owned: &HashSet<Uuid>,
  completed_tasks: u32,
) -> Vec<Badge> {
  catalog
    .iter()
    .filter(|badge| !owned.contains(&badge.badge_id))
    .filter(|badge| badge.trigger.is_met(user, completed_tasks))
    .cloned()
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn user(points: i64, streak: u32) -> User {
    User {
      user_id: Uuid::new_v4(),
      email: "ada@example.com".into(),
      username: "ada".into(),
      password_hash: String::new(),
      total_points: points,
      current_streak: streak,
      last_activity_at: None,
      created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    }
  }

  fn catalog() -> Vec<Badge> {
    default_catalog()
      .into_iter()
      .map(|seed| Badge {
        badge_id:    Uuid::new_v4(),
        name:        seed.name.into(),
        description: seed.description.into(),
        icon:        seed.icon.into(),
        trigger:     seed.trigger,
      })
      .collect()
  }

  #[test]
  fn first_completion_earns_exactly_the_first_task_badge() {
    let catalog = catalog();
    let earned =
      newly_earned(&user(20, 1), &catalog, &HashSet::new(), 1);
    let names: Vec<_> = earned.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["First Task"]);
  }

  #[test]
  fn crossing_a_points_threshold_earns_the_points_badge() {
    let catalog = catalog();
    let earned =
      newly_earned(&user(100, 1), &catalog, &HashSet::new(), 3);
    assert!(earned.iter().any(|b| b.name == "Dedicated"));
    assert!(!earned.iter().any(|b| b.name == "Millennium"));
  }

  #[test]
  fn streak_thresholds_gate_streak_badges() {
    let catalog = catalog();
    let earned =
      newly_earned(&user(10, 7), &catalog, &HashSet::new(), 1);
    let names: Vec<_> = earned.iter().map(|b| b.name.as_str()).collect();
    assert!(names.contains(&"Streak Starter"));
    assert!(names.contains(&"Streak Master"));
  }

  #[test]
  fn owned_badges_are_never_re_earned() {
    let catalog = catalog();
    let owned: HashSet<Uuid> =
      catalog.iter().map(|b| b.badge_id).collect();
    assert!(newly_earned(&user(5000, 30), &catalog, &owned, 500).is_empty());
  }

  #[test]
  fn results_come_back_in_catalog_order() {
    let catalog = catalog();
    let earned =
      newly_earned(&user(1000, 7), &catalog, &HashSet::new(), 100);
    let expected: Vec<_> = catalog
      .iter()
      .map(|b| b.name.clone())
      .collect();
    let got: Vec<_> = earned.iter().map(|b| b.name.clone()).collect();
    assert_eq!(got, expected);
  }

  #[test]
  fn zero_threshold_never_qualifies() {
    let dead = Badge {
      badge_id:    Uuid::new_v4(),
      name:        "Unreachable".into(),
      description: "Misconfigured".into(),
      icon:        "🚫".into(),
      trigger:     BadgeTrigger::Points(0),
    };
    assert!(newly_earned(&user(9999, 9), &[dead], &HashSet::new(), 9).is_empty());
  }
}
