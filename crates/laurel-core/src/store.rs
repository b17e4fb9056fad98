//! The `TaskStore` trait and supporting query/result types.
//!
//! The trait is implemented by storage backends (e.g.
//! `laurel-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  badge::{AwardedBadge, Badge, BadgeSeed},
  task::{NewTask, Task},
  user::{NewUser, User},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`TaskStore::list_tasks`].
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
  /// Restrict to one study subject (exact match).
  pub subject:   Option<String>,
  /// Restrict by completion status.
  pub completed: Option<bool>,
  /// `None` means unlimited.
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

// ─── Result types ────────────────────────────────────────────────────────────

/// The outcome of one completion event.
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
  pub task:           Task,
  pub points_earned:  i64,
  pub streak_updated: bool,
  /// Newly awarded badges, in catalog order. Empty when nothing new.
  pub badges_earned:  Vec<Badge>,
}

/// Aggregate progress numbers for a user's dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
  pub total_tasks:     u32,
  pub completed_tasks: u32,
  pub pending_tasks:   u32,
  pub total_points:    i64,
  pub current_streak:  u32,
  pub badges_count:    u32,
  /// Completed over total, in [0, 1]; 0.0 for a user with no tasks.
  pub completion_rate: f64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Laurel storage backend.
///
/// [`TaskStore::complete_task`] is the one compound operation: it must
/// apply the task mutation, the points, the streak update, and any badge
/// awards as a single atomic unit — either every effect of a completion is
/// visible afterwards, or none is.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TaskStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Validate and persist a new user with zeroed counters.
  /// Fails when the email or username is already registered.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by UUID. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Retrieve a user by email — the login lookup.
  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Tasks ─────────────────────────────────────────────────────────────

  /// Validate and persist a new, not-yet-completed task.
  fn add_task(
    &self,
    input: NewTask,
  ) -> impl Future<Output = Result<Task, Self::Error>> + Send + '_;

  /// Retrieve one of `owner_id`'s tasks. Returns `None` when the task does
  /// not exist — or exists but belongs to someone else.
  fn get_task(
    &self,
    owner_id: Uuid,
    task_id: Uuid,
  ) -> impl Future<Output = Result<Option<Task>, Self::Error>> + Send + '_;

  /// List `owner_id`'s tasks: due date ascending (undated last), then
  /// weight descending.
  fn list_tasks<'a>(
    &'a self,
    owner_id: Uuid,
    query: &'a TaskQuery,
  ) -> impl Future<Output = Result<Vec<Task>, Self::Error>> + Send + 'a;

  /// Delete one of `owner_id`'s tasks. Points and badges already earned
  /// from it are unaffected.
  fn delete_task(
    &self,
    owner_id: Uuid,
    task_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Distinct subject names across `owner_id`'s tasks, sorted.
  fn list_subjects(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  // ── Completion ────────────────────────────────────────────────────────

  /// The completion pipeline: mark the task complete, award points, update
  /// the streak, evaluate badges — atomically. Fails with a conflict when
  /// the task is already completed, leaving every record untouched.
  fn complete_task(
    &self,
    owner_id: Uuid,
    task_id: Uuid,
  ) -> impl Future<Output = Result<Completion, Self::Error>> + Send + '_;

  // ── Badges ────────────────────────────────────────────────────────────

  /// Insert any catalog entries not already present (matched by name).
  /// Safe to call on every startup.
  fn seed_badges<'a>(
    &'a self,
    seeds: &'a [BadgeSeed],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// The full badge catalog.
  fn list_badges(
    &self,
  ) -> impl Future<Output = Result<Vec<Badge>, Self::Error>> + Send + '_;

  /// The badges a user has earned, oldest first.
  fn list_awards(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AwardedBadge>, Self::Error>> + Send + '_;

  // ── Stats ─────────────────────────────────────────────────────────────

  /// Aggregate progress numbers for one user.
  fn user_stats(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<UserStats, Self::Error>> + Send + '_;
}
