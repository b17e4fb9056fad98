//! Handlers for `/tasks` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/tasks` | Create for the current user |
//! | `GET`    | `/tasks` | `?subject=&completed=&skip=&limit=` |
//! | `GET`    | `/tasks/export` | CSV report |
//! | `GET`    | `/tasks/subjects` | Distinct subject names |
//! | `GET`    | `/tasks/:id` | 404 if absent or not owned |
//! | `PATCH`  | `/tasks/:id/complete` | 409 if already completed |
//! | `DELETE` | `/tasks/:id` | Earned points/badges survive |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use laurel_core::{
  store::{Completion, TaskQuery, TaskStore},
  task::{NewTask, Task},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::{ApiError, store_err},
};

// ─── Create ───────────────────────────────────────────────────────────────────

fn default_weight() -> u8 { 1 }

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:       String,
  pub description: Option<String>,
  pub subject:     String,
  #[serde(default = "default_weight")]
  pub weight:      u8,
  pub due_date:    Option<DateTime<Utc>>,
}

/// `POST /tasks`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  let task = state
    .store
    .add_task(NewTask {
      owner_id:    user.user_id,
      title:       body.title,
      description: body.description,
      subject:     body.subject,
      weight:      body.weight,
      due_date:    body.due_date,
    })
    .await
    .map_err(store_err)?;

  Ok((StatusCode::CREATED, Json(task)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub subject:   Option<String>,
  pub completed: Option<bool>,
  pub skip:      Option<usize>,
  pub limit:     Option<usize>,
}

/// `GET /tasks[?subject=...][&completed=...][&skip=...][&limit=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Task>>, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  let query = TaskQuery {
    subject:   params.subject,
    completed: params.completed,
    limit:     Some(params.limit.unwrap_or(100)),
    offset:    params.skip,
  };

  let tasks = state
    .store
    .list_tasks(user.user_id, &query)
    .await
    .map_err(store_err)?;
  Ok(Json(tasks))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /tasks/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  let task = state
    .store
    .get_task(user.user_id, id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("task {id} not found")))?;
  Ok(Json(task))
}

// ─── Complete ─────────────────────────────────────────────────────────────────

/// `PATCH /tasks/:id/complete` — the completion pipeline.
pub async fn complete_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Completion>, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  let completion = state
    .store
    .complete_task(user.user_id, id)
    .await
    .map_err(store_err)?;
  Ok(Json(completion))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /tasks/:id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  state
    .store
    .delete_task(user.user_id, id)
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Subjects ─────────────────────────────────────────────────────────────────

/// `GET /tasks/subjects`
pub async fn subjects<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  let subjects = state
    .store
    .list_subjects(user.user_id)
    .await
    .map_err(store_err)?;
  Ok(Json(subjects))
}

// ─── Export ───────────────────────────────────────────────────────────────────

/// `GET /tasks/export` — all of the user's tasks as CSV.
pub async fn export<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  let tasks = state
    .store
    .list_tasks(user.user_id, &TaskQuery::default())
    .await
    .map_err(store_err)?;

  let mut csv = String::from("ID,Title,Points,Status\n");
  for task in &tasks {
    let status = if task.is_completed { "Completed" } else { "Pending" };
    // Commas in titles would break the row format.
    let title = task.title.replace(',', " ");
    csv.push_str(&format!(
      "{},{},{},{}\n",
      task.task_id, title, task.points_awarded, status
    ));
  }

  Ok(([(header::CONTENT_TYPE, "text/csv")], csv))
}
