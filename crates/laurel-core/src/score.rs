//! Points and streak arithmetic — the pure half of the completion pipeline.
//!
//! Both operations take the current instant as an argument, so callers own
//! the clock and tests can pin it.

use chrono::{DateTime, Utc};

use crate::user::User;

/// Late completions bottom out here, so even a weight-1 late task earns
/// something.
const LATE_FLOOR: i64 = 5;

/// `weight * 10` when on time; half of that, floored at [`LATE_FLOOR`],
/// when late.
pub fn compute_points(weight: u8, on_time: bool) -> i64 {
  let base = i64::from(weight) * 10;
  if on_time { base } else { (base / 2).max(LATE_FLOOR) }
}

/// A task with no due date is always on time.
pub fn is_on_time(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
  due_date.map_or(true, |due| now <= due)
}

/// Advance the user's daily streak for activity at `now`.
///
/// Returns whether the counter changed. `last_activity_at` is touched only
/// on a `true` return, which is what makes the next-day consecutive check
/// work: repeat completions within one calendar day leave both fields
/// alone, so the streak grows at most once per day.
pub fn update_streak(user: &mut User, now: DateTime<Utc>) -> bool {
  let today = now.date_naive();

  let changed = match user.last_activity_at.map(|at| at.date_naive()) {
    None => {
      user.current_streak = 1;
      true
    }
    Some(last) if last == today => {
      // Same-day guard: a zero streak alongside today's activity date is a
      // state no completion leaves behind; correct it rather than no-op.
      if user.current_streak == 0 {
        user.current_streak = 1;
        true
      } else {
        false
      }
    }
    Some(last) if (today - last).num_days() == 1 => {
      user.current_streak += 1;
      true
    }
    Some(_) => {
      // Gap of more than one day: the streak starts over.
      user.current_streak = 1;
      true
    }
  };

  if changed {
    user.last_activity_at = Some(now);
  }
  changed
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn on_time_points_scale_with_weight() {
    for weight in 1..=10u8 {
      assert_eq!(compute_points(weight, true), i64::from(weight) * 10);
    }
  }

  #[test]
  fn late_points_are_halved_with_a_floor() {
    for weight in 1..=10u8 {
      let expected = (i64::from(weight) * 10 / 2).max(5);
      assert_eq!(compute_points(weight, false), expected);
    }
    // Spot checks from the scoring table.
    assert_eq!(compute_points(1, false), 5);
    assert_eq!(compute_points(4, false), 20);
    assert_eq!(compute_points(10, false), 50);
  }

  #[test]
  fn missing_due_date_is_always_on_time() {
    assert!(is_on_time(None, Utc::now()));
  }

  #[test]
  fn due_date_boundary_is_inclusive() {
    let due = Utc.with_ymd_and_hms(2026, 3, 10, 23, 59, 59).unwrap();
    assert!(is_on_time(Some(due), due));
    assert!(is_on_time(Some(due), due - chrono::Duration::seconds(1)));
    assert!(!is_on_time(Some(due), due + chrono::Duration::seconds(1)));
  }

  fn user(streak: u32, last_activity_at: Option<DateTime<Utc>>) -> User {
    User {
      user_id: Uuid::new_v4(),
      email: "ada@example.com".into(),
      username: "ada".into(),
      password_hash: String::new(),
      total_points: 0,
      current_streak: streak,
      last_activity_at,
      created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    }
  }

  fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
  }

  #[test]
  fn never_active_user_starts_a_streak() {
    let mut u = user(0, None);
    let now = at(2026, 3, 10, 9);
    assert!(update_streak(&mut u, now));
    assert_eq!(u.current_streak, 1);
    assert_eq!(u.last_activity_at, Some(now));
  }

  #[test]
  fn consecutive_day_increments() {
    let mut u = user(4, Some(at(2026, 3, 9, 22)));
    let now = at(2026, 3, 10, 7);
    assert!(update_streak(&mut u, now));
    assert_eq!(u.current_streak, 5);
    assert_eq!(u.last_activity_at, Some(now));
  }

  #[test]
  fn same_day_is_a_no_op() {
    let first = at(2026, 3, 10, 8);
    let mut u = user(3, Some(first));
    assert!(!update_streak(&mut u, at(2026, 3, 10, 20)));
    assert_eq!(u.current_streak, 3);
    // The activity instant is preserved, not refreshed.
    assert_eq!(u.last_activity_at, Some(first));
  }

  #[test]
  fn same_day_with_zero_streak_is_corrected() {
    let mut u = user(0, Some(at(2026, 3, 10, 8)));
    let now = at(2026, 3, 10, 12);
    assert!(update_streak(&mut u, now));
    assert_eq!(u.current_streak, 1);
    assert_eq!(u.last_activity_at, Some(now));
  }

  #[test]
  fn gap_resets_to_one() {
    let mut u = user(10, Some(at(2026, 3, 5, 9)));
    let now = at(2026, 3, 10, 9);
    assert!(update_streak(&mut u, now));
    assert_eq!(u.current_streak, 1);
    assert_eq!(u.last_activity_at, Some(now));
  }

  #[test]
  fn streak_spans_a_month_boundary() {
    let mut u = user(2, Some(at(2026, 2, 28, 23)));
    assert!(update_streak(&mut u, at(2026, 3, 1, 0)));
    assert_eq!(u.current_streak, 3);
  }
}
