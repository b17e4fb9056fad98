//! Handlers for `/auth` and `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Body: `{"email","username","password"}` |
//! | `POST` | `/auth/login` | Returns a bearer token |
//! | `GET`  | `/users/me` | Current user |
//! | `GET`  | `/users/dashboard` | User + tasks + earned badges |
//! | `GET`  | `/users/stats` | Aggregate progress numbers |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use laurel_core::{
  badge::AwardedBadge,
  store::{TaskQuery, TaskStore, UserStats},
  task::Task,
  user::{NewUser, User},
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::{self, CurrentUser},
  error::{ApiError, store_err},
};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:    String,
  pub username: String,
  pub password: String,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  if body.password.chars().count() < 6 {
    return Err(ApiError::BadRequest(
      "password must be at least 6 characters".to_owned(),
    ));
  }

  let password_hash = auth::hash_password(&body.password)?;
  let user = state
    .store
    .add_user(NewUser {
      email: body.email,
      username: body.username,
      password_hash,
    })
    .await
    .map_err(store_err)?;

  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub token_type:   &'static str,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<TokenResponse>, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  let user = state
    .store
    .get_user_by_email(&body.email)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::Unauthorized)?;

  if !auth::verify_password(&body.password, &user.password_hash) {
    return Err(ApiError::Unauthorized);
  }

  let access_token = auth::issue_token(user.user_id, &state.auth)?;
  Ok(Json(TokenResponse { access_token, token_type: "bearer" }))
}

// ─── Current user ─────────────────────────────────────────────────────────────

/// `GET /users/me`
pub async fn me<S>(CurrentUser(user): CurrentUser) -> Json<User>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  Json(user)
}

// ─── Dashboard ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Dashboard {
  pub user:   User,
  pub tasks:  Vec<Task>,
  pub badges: Vec<AwardedBadge>,
}

/// `GET /users/dashboard`
pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Dashboard>, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  let tasks = state
    .store
    .list_tasks(user.user_id, &TaskQuery::default())
    .await
    .map_err(store_err)?;
  let badges = state
    .store
    .list_awards(user.user_id)
    .await
    .map_err(store_err)?;

  Ok(Json(Dashboard { user, tasks, badges }))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /users/stats`
pub async fn stats<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<UserStats>, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  let stats = state
    .store
    .user_stats(user.user_id)
    .await
    .map_err(store_err)?;
  Ok(Json(stats))
}
