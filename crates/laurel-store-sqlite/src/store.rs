//! [`SqliteStore`] — the SQLite implementation of [`TaskStore`].
//!
//! Single-statement operations run directly on the store's connection
//! thread. The completion pipeline runs in [`complete_task_tx`], where an
//! IMMEDIATE transaction is the unit of work: every staging helper receives
//! the open [`Transaction`], and it is committed exactly once at the end.

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use laurel_core::{
  badge::{self, AwardedBadge, Badge, BadgeSeed},
  score,
  store::{Completion, TaskQuery, TaskStore, UserStats},
  task::{NewTask, Task},
  user::{NewUser, User},
};
use rusqlite::{OptionalExtension as _, Transaction, TransactionBehavior};
use uuid::Uuid;

use crate::{
  encode::{RawBadge, RawTask, RawUser, encode_dt, encode_trigger, encode_uuid},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Laurel store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// funnel through one connection thread, so writes to a given user row are
/// naturally serialised.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Column lists and row mappers ────────────────────────────────────────────

const USER_COLUMNS: &str = "user_id, email, username, password_hash, \
   total_points, current_streak, last_activity_at, created_at";

const TASK_COLUMNS: &str = "task_id, owner_id, title, description, subject, \
   weight, due_date, is_completed, completed_at, points_awarded, created_at";

const BADGE_COLUMNS: &str =
  "badge_id, name, description, icon, trigger_kind, threshold";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:          row.get(0)?,
    email:            row.get(1)?,
    username:         row.get(2)?,
    password_hash:    row.get(3)?,
    total_points:     row.get(4)?,
    current_streak:   row.get(5)?,
    last_activity_at: row.get(6)?,
    created_at:       row.get(7)?,
  })
}

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawTask> {
  Ok(RawTask {
    task_id:        row.get(0)?,
    owner_id:       row.get(1)?,
    title:          row.get(2)?,
    description:    row.get(3)?,
    subject:        row.get(4)?,
    weight:         row.get(5)?,
    due_date:       row.get(6)?,
    is_completed:   row.get(7)?,
    completed_at:   row.get(8)?,
    points_awarded: row.get(9)?,
    created_at:     row.get(10)?,
  })
}

fn badge_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawBadge> {
  Ok(RawBadge {
    badge_id:     row.get(0)?,
    name:         row.get(1)?,
    description:  row.get(2)?,
    icon:         row.get(3)?,
    trigger_kind: row.get(4)?,
    threshold:    row.get(5)?,
  })
}

// ─── Read helpers ────────────────────────────────────────────────────────────

fn query_user(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> Result<Option<User>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
      rusqlite::params![id_str],
      user_from_row,
    )
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

fn query_user_by_email(
  conn: &rusqlite::Connection,
  email: &str,
) -> Result<Option<User>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
      rusqlite::params![email],
      user_from_row,
    )
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

fn query_task(
  conn: &rusqlite::Connection,
  owner_str: &str,
  task_str: &str,
) -> Result<Option<Task>> {
  conn
    .query_row(
      &format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE task_id = ?1 AND owner_id = ?2"
      ),
      rusqlite::params![task_str, owner_str],
      task_from_row,
    )
    .optional()?
    .map(RawTask::into_task)
    .transpose()
}

fn query_tasks(
  conn: &rusqlite::Connection,
  owner_str: &str,
  query: &TaskQuery,
) -> Result<Vec<Task>> {
  let mut conds: Vec<&'static str> = vec!["owner_id = ?1"];
  if query.subject.is_some() {
    conds.push("subject = ?2");
  }
  if query.completed.is_some() {
    conds.push("is_completed = ?3");
  }

  let sql = format!(
    "SELECT {TASK_COLUMNS} FROM tasks
     WHERE {}
     ORDER BY due_date IS NULL, due_date ASC, weight DESC
     LIMIT ?4 OFFSET ?5",
    conds.join(" AND ")
  );

  // A negative LIMIT means unlimited in SQLite.
  let limit_val = query.limit.map_or(-1, |l| l as i64);
  let offset_val = query.offset.unwrap_or(0) as i64;

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(
      rusqlite::params![
        owner_str,
        query.subject.as_deref(),
        query.completed,
        limit_val,
        offset_val,
      ],
      task_from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(RawTask::into_task).collect()
}

fn query_badges(conn: &rusqlite::Connection) -> Result<Vec<Badge>> {
  let mut stmt = conn
    .prepare(&format!("SELECT {BADGE_COLUMNS} FROM badges ORDER BY rowid"))?;
  let raws = stmt
    .query_map([], badge_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawBadge::into_badge).collect()
}

fn query_owned_badge_ids(
  conn: &rusqlite::Connection,
  user_str: &str,
) -> Result<HashSet<Uuid>> {
  let mut stmt =
    conn.prepare("SELECT badge_id FROM badge_awards WHERE user_id = ?1")?;
  let ids = stmt
    .query_map(rusqlite::params![user_str], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  ids
    .iter()
    .map(|s| crate::encode::decode_uuid(s))
    .collect()
}

fn count_completed(conn: &rusqlite::Connection, owner_str: &str) -> Result<u32> {
  Ok(conn.query_row(
    "SELECT COUNT(*) FROM tasks WHERE owner_id = ?1 AND is_completed = 1",
    rusqlite::params![owner_str],
    |row| row.get(0),
  )?)
}

// ─── Staging helpers (completion unit of work) ───────────────────────────────

/// Stage the one-way completion transition of a task.
fn stage_task_completion(tx: &Transaction<'_>, task: &Task) -> Result<()> {
  tx.execute(
    "UPDATE tasks
     SET is_completed = 1, completed_at = ?1, points_awarded = ?2
     WHERE task_id = ?3",
    rusqlite::params![
      task.completed_at.map(encode_dt),
      task.points_awarded,
      encode_uuid(task.task_id),
    ],
  )?;
  Ok(())
}

/// Stage the user's points and streak counters.
fn stage_user_progress(tx: &Transaction<'_>, user: &User) -> Result<()> {
  tx.execute(
    "UPDATE users
     SET total_points = ?1, current_streak = ?2, last_activity_at = ?3
     WHERE user_id = ?4",
    rusqlite::params![
      user.total_points,
      user.current_streak,
      user.last_activity_at.map(encode_dt),
      encode_uuid(user.user_id),
    ],
  )?;
  Ok(())
}

/// Stage one badge award row.
fn stage_award(
  tx: &Transaction<'_>,
  user_id: Uuid,
  badge_id: Uuid,
  earned_at: chrono::DateTime<Utc>,
) -> Result<()> {
  tx.execute(
    "INSERT INTO badge_awards (user_id, badge_id, earned_at)
     VALUES (?1, ?2, ?3)",
    rusqlite::params![
      encode_uuid(user_id),
      encode_uuid(badge_id),
      encode_dt(earned_at),
    ],
  )?;
  Ok(())
}

// ─── The completion pipeline ─────────────────────────────────────────────────

/// Mark a task complete and apply every downstream effect in one
/// transaction.
///
/// The IMMEDIATE behaviour takes the write lock up front, so two
/// completions of the same task serialise and the loser fails the
/// already-completed check; nothing is observable until `commit`.
fn complete_task_tx(
  conn: &mut rusqlite::Connection,
  owner_id: Uuid,
  task_id: Uuid,
) -> Result<Completion> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let owner_str = encode_uuid(owner_id);
  let task_str = encode_uuid(task_id);

  let mut user = query_user(&tx, &owner_str)?
    .ok_or(laurel_core::Error::UserNotFound(owner_id))?;
  let mut task = query_task(&tx, &owner_str, &task_str)?
    .ok_or(laurel_core::Error::TaskNotFound(task_id))?;

  if task.is_completed {
    return Err(laurel_core::Error::AlreadyCompleted(task_id).into());
  }

  let now = Utc::now();

  // Points.
  task.is_completed = true;
  let on_time = score::is_on_time(task.due_date, now);
  let points = score::compute_points(task.weight, on_time);
  task.completed_at = Some(now);
  task.points_awarded = points;
  user.total_points += points;
  stage_task_completion(&tx, &task)?;

  // Streak.
  let streak_updated = score::update_streak(&mut user, now);
  stage_user_progress(&tx, &user)?;

  // Badges. The completed count is re-read inside the transaction so it
  // includes the row staged above.
  let completed_tasks = count_completed(&tx, &owner_str)?;
  let catalog = query_badges(&tx)?;
  let owned = query_owned_badge_ids(&tx, &owner_str)?;
  let badges_earned = badge::newly_earned(&user, &catalog, &owned, completed_tasks);
  for earned in &badges_earned {
    stage_award(&tx, owner_id, earned.badge_id, now)?;
  }

  tx.commit()?;

  Ok(Completion { task, points_earned: points, streak_updated, badges_earned })
}

// ─── Write helpers ───────────────────────────────────────────────────────────

fn insert_user(conn: &rusqlite::Connection, user: &User) -> Result<()> {
  let email_taken: bool = conn
    .query_row(
      "SELECT 1 FROM users WHERE email = ?1",
      rusqlite::params![user.email],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  if email_taken {
    return Err(laurel_core::Error::EmailTaken(user.email.clone()).into());
  }

  let username_taken: bool = conn
    .query_row(
      "SELECT 1 FROM users WHERE username = ?1",
      rusqlite::params![user.username],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  if username_taken {
    return Err(
      laurel_core::Error::UsernameTaken(user.username.clone()).into(),
    );
  }

  conn.execute(
    "INSERT INTO users (
       user_id, email, username, password_hash,
       total_points, current_streak, last_activity_at, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      encode_uuid(user.user_id),
      user.email,
      user.username,
      user.password_hash,
      user.total_points,
      user.current_streak,
      user.last_activity_at.map(encode_dt),
      encode_dt(user.created_at),
    ],
  )?;
  Ok(())
}

fn insert_task(conn: &rusqlite::Connection, task: &Task) -> Result<()> {
  conn.execute(
    "INSERT INTO tasks (
       task_id, owner_id, title, description, subject, weight,
       due_date, is_completed, completed_at, points_awarded, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    rusqlite::params![
      encode_uuid(task.task_id),
      encode_uuid(task.owner_id),
      task.title,
      task.description,
      task.subject,
      task.weight,
      task.due_date.map(encode_dt),
      task.is_completed,
      task.completed_at.map(encode_dt),
      task.points_awarded,
      encode_dt(task.created_at),
    ],
  )?;
  Ok(())
}

fn seed_badges_tx(
  conn: &mut rusqlite::Connection,
  seeds: &[BadgeSeed],
) -> Result<()> {
  let tx = conn.transaction()?;
  for seed in seeds {
    let exists: bool = tx
      .query_row(
        "SELECT 1 FROM badges WHERE name = ?1",
        rusqlite::params![seed.name],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false);
    if exists {
      continue;
    }

    let (kind, threshold) = encode_trigger(seed.trigger);
    tx.execute(
      "INSERT INTO badges (
         badge_id, name, description, icon, trigger_kind, threshold
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        seed.name,
        seed.description,
        seed.icon,
        kind,
        threshold,
      ],
    )?;
  }
  tx.commit()?;
  Ok(())
}

fn query_stats(
  conn: &rusqlite::Connection,
  user_id: Uuid,
) -> Result<UserStats> {
  let user_str = encode_uuid(user_id);
  let user = query_user(conn, &user_str)?
    .ok_or(laurel_core::Error::UserNotFound(user_id))?;

  let (total_tasks, completed_tasks): (u32, u32) = conn.query_row(
    "SELECT COUNT(*), COALESCE(SUM(is_completed), 0)
     FROM tasks WHERE owner_id = ?1",
    rusqlite::params![user_str],
    |row| Ok((row.get(0)?, row.get(1)?)),
  )?;

  let badges_count: u32 = conn.query_row(
    "SELECT COUNT(*) FROM badge_awards WHERE user_id = ?1",
    rusqlite::params![user_str],
    |row| row.get(0),
  )?;

  let completion_rate = if total_tasks == 0 {
    0.0
  } else {
    f64::from(completed_tasks) / f64::from(total_tasks)
  };

  Ok(UserStats {
    total_tasks,
    completed_tasks,
    pending_tasks: total_tasks - completed_tasks,
    total_points: user.total_points,
    current_streak: user.current_streak,
    badges_count,
    completion_rate,
  })
}

// ─── TaskStore impl ──────────────────────────────────────────────────────────

impl TaskStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let input = input.validated().map_err(Error::Core)?;
    let user = User {
      user_id:          Uuid::new_v4(),
      email:            input.email,
      username:         input.username,
      password_hash:    input.password_hash,
      total_points:     0,
      current_streak:   0,
      last_activity_at: None,
      created_at:       Utc::now(),
    };

    self
      .conn
      .call(move |conn| Ok(insert_user(conn, &user).map(|()| user)))
      .await?
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| Ok(query_user(conn, &id_str)))
      .await?
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();
    self
      .conn
      .call(move |conn| Ok(query_user_by_email(conn, &email)))
      .await?
  }

  // ── Tasks ─────────────────────────────────────────────────────────────────

  async fn add_task(&self, input: NewTask) -> Result<Task> {
    let input = input.validated().map_err(Error::Core)?;
    let task = Task {
      task_id:        Uuid::new_v4(),
      owner_id:       input.owner_id,
      title:          input.title,
      description:    input.description,
      subject:        input.subject,
      weight:         input.weight,
      due_date:       input.due_date,
      is_completed:   false,
      completed_at:   None,
      points_awarded: 0,
      created_at:     Utc::now(),
    };

    self
      .conn
      .call(move |conn| Ok(insert_task(conn, &task).map(|()| task)))
      .await?
  }

  async fn get_task(
    &self,
    owner_id: Uuid,
    task_id: Uuid,
  ) -> Result<Option<Task>> {
    let owner_str = encode_uuid(owner_id);
    let task_str = encode_uuid(task_id);
    self
      .conn
      .call(move |conn| Ok(query_task(conn, &owner_str, &task_str)))
      .await?
  }

  async fn list_tasks(
    &self,
    owner_id: Uuid,
    query: &TaskQuery,
  ) -> Result<Vec<Task>> {
    let owner_str = encode_uuid(owner_id);
    let query = query.clone();
    self
      .conn
      .call(move |conn| Ok(query_tasks(conn, &owner_str, &query)))
      .await?
  }

  async fn delete_task(&self, owner_id: Uuid, task_id: Uuid) -> Result<()> {
    let owner_str = encode_uuid(owner_id);
    let task_str = encode_uuid(task_id);
    self
      .conn
      .call(move |conn| {
        let deleted = conn.execute(
          "DELETE FROM tasks WHERE task_id = ?1 AND owner_id = ?2",
          rusqlite::params![task_str, owner_str],
        )?;
        if deleted == 0 {
          return Ok(Err(laurel_core::Error::TaskNotFound(task_id).into()));
        }
        Ok(Ok(()))
      })
      .await?
  }

  async fn list_subjects(&self, owner_id: Uuid) -> Result<Vec<String>> {
    let owner_str = encode_uuid(owner_id);
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT subject FROM tasks
           WHERE owner_id = ?1 ORDER BY subject ASC",
        )?;
        let subjects = stmt
          .query_map(rusqlite::params![owner_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(Ok(subjects))
      })
      .await?
  }

  // ── Completion ────────────────────────────────────────────────────────────

  async fn complete_task(
    &self,
    owner_id: Uuid,
    task_id: Uuid,
  ) -> Result<Completion> {
    self
      .conn
      .call(move |conn| Ok(complete_task_tx(conn, owner_id, task_id)))
      .await?
  }

  // ── Badges ────────────────────────────────────────────────────────────────

  async fn seed_badges(&self, seeds: &[BadgeSeed]) -> Result<()> {
    let seeds = seeds.to_vec();
    self
      .conn
      .call(move |conn| Ok(seed_badges_tx(conn, &seeds)))
      .await?
  }

  async fn list_badges(&self) -> Result<Vec<Badge>> {
    self.conn.call(|conn| Ok(query_badges(conn))).await?
  }

  async fn list_awards(&self, user_id: Uuid) -> Result<Vec<AwardedBadge>> {
    let user_str = encode_uuid(user_id);
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT b.badge_id, b.name, b.description, b.icon,
                  b.trigger_kind, b.threshold, a.earned_at
           FROM badge_awards a
           JOIN badges b ON b.badge_id = a.badge_id
           WHERE a.user_id = ?1
           ORDER BY a.earned_at ASC, b.rowid ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok((badge_from_row(row)?, row.get::<_, String>(6)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let awards = rows
          .into_iter()
          .map(|(raw, earned_at)| {
            Ok(AwardedBadge {
              badge:     raw.into_badge()?,
              earned_at: crate::encode::decode_dt(&earned_at)?,
            })
          })
          .collect::<Result<Vec<_>>>();
        Ok(awards)
      })
      .await?
  }

  // ── Stats ─────────────────────────────────────────────────────────────────

  async fn user_stats(&self, user_id: Uuid) -> Result<UserStats> {
    self
      .conn
      .call(move |conn| Ok(query_stats(conn, user_id)))
      .await?
  }
}
