//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings; UUIDs as hyphenated
//! lowercase strings; badge triggers as a discriminant column plus an
//! integer threshold.

use chrono::{DateTime, Utc};
use laurel_core::{
  badge::{Badge, BadgeTrigger},
  task::Task,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── BadgeTrigger ────────────────────────────────────────────────────────────

/// `(trigger_kind, threshold)` column pair for a trigger.
pub fn encode_trigger(trigger: BadgeTrigger) -> (&'static str, i64) {
  let threshold = match trigger {
    BadgeTrigger::Points(points) => points,
    BadgeTrigger::TaskCount(count) => i64::from(count),
    BadgeTrigger::StreakDays(days) => i64::from(days),
  };
  (trigger.discriminant(), threshold)
}

pub fn decode_trigger(kind: &str, threshold: i64) -> Result<BadgeTrigger> {
  match kind {
    "points" => Ok(BadgeTrigger::Points(threshold)),
    "task_count" => Ok(BadgeTrigger::TaskCount(threshold.max(0) as u32)),
    "streak_days" => Ok(BadgeTrigger::StreakDays(threshold.max(0) as u32)),
    other => Err(Error::UnknownTriggerKind(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:          String,
  pub email:            String,
  pub username:         String,
  pub password_hash:    String,
  pub total_points:     i64,
  pub current_streak:   u32,
  pub last_activity_at: Option<String>,
  pub created_at:       String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:          decode_uuid(&self.user_id)?,
      email:            self.email,
      username:         self.username,
      password_hash:    self.password_hash,
      total_points:     self.total_points,
      current_streak:   self.current_streak,
      last_activity_at: self
        .last_activity_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `tasks` row.
pub struct RawTask {
  pub task_id:        String,
  pub owner_id:       String,
  pub title:          String,
  pub description:    Option<String>,
  pub subject:        String,
  pub weight:         u8,
  pub due_date:       Option<String>,
  pub is_completed:   bool,
  pub completed_at:   Option<String>,
  pub points_awarded: i64,
  pub created_at:     String,
}

impl RawTask {
  pub fn into_task(self) -> Result<Task> {
    Ok(Task {
      task_id:        decode_uuid(&self.task_id)?,
      owner_id:       decode_uuid(&self.owner_id)?,
      title:          self.title,
      description:    self.description,
      subject:        self.subject,
      weight:         self.weight,
      due_date:       self.due_date.as_deref().map(decode_dt).transpose()?,
      is_completed:   self.is_completed,
      completed_at:   self.completed_at.as_deref().map(decode_dt).transpose()?,
      points_awarded: self.points_awarded,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `badges` row.
pub struct RawBadge {
  pub badge_id:     String,
  pub name:         String,
  pub description:  String,
  pub icon:         String,
  pub trigger_kind: String,
  pub threshold:    i64,
}

impl RawBadge {
  pub fn into_badge(self) -> Result<Badge> {
    Ok(Badge {
      badge_id:    decode_uuid(&self.badge_id)?,
      name:        self.name,
      description: self.description,
      icon:        self.icon,
      trigger:     decode_trigger(&self.trigger_kind, self.threshold)?,
    })
  }
}
