//! SQL schema for the Laurel SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id          TEXT PRIMARY KEY,
    email            TEXT NOT NULL UNIQUE,
    username         TEXT NOT NULL UNIQUE,
    password_hash    TEXT NOT NULL,
    total_points     INTEGER NOT NULL DEFAULT 0,
    current_streak   INTEGER NOT NULL DEFAULT 0,
    last_activity_at TEXT,            -- ISO 8601 UTC; NULL until first completion
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id        TEXT PRIMARY KEY,
    owner_id       TEXT NOT NULL REFERENCES users(user_id),
    title          TEXT NOT NULL,
    description    TEXT,
    subject        TEXT NOT NULL,
    weight         INTEGER NOT NULL DEFAULT 1,   -- 1..10, fixed at creation
    due_date       TEXT,
    is_completed   INTEGER NOT NULL DEFAULT 0,
    completed_at   TEXT,
    points_awarded INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL
);

-- The catalog. Seeded at startup, read-only afterwards.
CREATE TABLE IF NOT EXISTS badges (
    badge_id     TEXT PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE,
    description  TEXT NOT NULL,
    icon         TEXT NOT NULL,
    trigger_kind TEXT NOT NULL,      -- 'points' | 'task_count' | 'streak_days'
    threshold    INTEGER NOT NULL
);

-- One row per badge a user has earned. The UNIQUE constraint is a backstop;
-- the evaluator checks the owned set before inserting.
CREATE TABLE IF NOT EXISTS badge_awards (
    user_id   TEXT NOT NULL REFERENCES users(user_id),
    badge_id  TEXT NOT NULL REFERENCES badges(badge_id),
    earned_at TEXT NOT NULL,
    UNIQUE (user_id, badge_id)
);

CREATE INDEX IF NOT EXISTS tasks_owner_idx   ON tasks(owner_id);
CREATE INDEX IF NOT EXISTS tasks_subject_idx ON tasks(owner_id, subject);
CREATE INDEX IF NOT EXISTS awards_user_idx   ON badge_awards(user_id);

PRAGMA user_version = 1;
";
