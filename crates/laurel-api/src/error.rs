//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        "invalid or missing credentials".to_owned(),
      ),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

/// Map a store failure onto the HTTP taxonomy via the core error type.
pub fn store_err<E: Into<laurel_core::Error>>(e: E) -> ApiError {
  use laurel_core::Error;

  match e.into() {
    Error::UserNotFound(id) => ApiError::NotFound(format!("user {id} not found")),
    Error::TaskNotFound(id) => ApiError::NotFound(format!("task {id} not found")),
    Error::AlreadyCompleted(id) => {
      ApiError::Conflict(format!("task {id} is already completed"))
    }
    Error::EmailTaken(_) => {
      ApiError::BadRequest("email already registered".to_owned())
    }
    Error::UsernameTaken(_) => {
      ApiError::BadRequest("username already taken".to_owned())
    }
    e @ Error::Validation { .. } => ApiError::BadRequest(e.to_string()),
    Error::Storage(m) => ApiError::Internal(m),
  }
}
