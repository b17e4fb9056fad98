//! JSON REST API for Laurel.
//!
//! Exposes an axum [`Router`] backed by any [`laurel_core::store::TaskStore`].
//! Registration and login are public; everything else sits behind a JWT
//! bearer token issued at login.

pub mod auth;
pub mod badges;
pub mod error;
pub mod tasks;
pub mod users;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  http::HeaderValue,
  routing::{get, patch, post},
};
use laurel_core::store::TaskStore;
use serde::Deserialize;
use serde_json::json;
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_token_ttl() -> i64 { 30 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `LAUREL_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  /// HS256 signing secret for bearer tokens.
  pub jwt_secret:        String,
  #[serde(default = "default_token_ttl")]
  pub token_ttl_minutes: i64,
  /// Origins allowed by the CORS layer; empty means none.
  #[serde(default)]
  pub cors_origins:      Vec<String>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: TaskStore> {
  pub store:  Arc<S>,
  pub auth:   Arc<AuthConfig>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  let cors = cors_layer(&state.config.cors_origins);

  Router::new()
    .route("/", get(root))
    .route("/health", get(health))
    // Auth
    .route("/auth/register", post(users::register::<S>))
    .route("/auth/login", post(users::login::<S>))
    // Users
    .route("/users/me", get(users::me::<S>))
    .route("/users/dashboard", get(users::dashboard::<S>))
    .route("/users/stats", get(users::stats::<S>))
    // Tasks
    .route("/tasks", post(tasks::create::<S>).get(tasks::list::<S>))
    .route("/tasks/export", get(tasks::export::<S>))
    .route("/tasks/subjects", get(tasks::subjects::<S>))
    .route(
      "/tasks/{id}",
      get(tasks::get_one::<S>).delete(tasks::delete_one::<S>),
    )
    .route("/tasks/{id}/complete", patch(tasks::complete_one::<S>))
    // Badges
    .route("/badges", get(badges::list::<S>))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
  let origins: Vec<HeaderValue> =
    origins.iter().filter_map(|o| o.parse().ok()).collect();
  CorsLayer::new()
    .allow_origin(AllowOrigin::list(origins))
    .allow_methods(Any)
    .allow_headers(Any)
}

// ─── Service endpoints ────────────────────────────────────────────────────────

async fn root() -> Json<serde_json::Value> {
  Json(json!({
    "service": "laurel",
    "version": env!("CARGO_PKG_VERSION"),
    "status":  "online",
  }))
}

async fn health() -> Json<serde_json::Value> {
  Json(json!({ "status": "healthy" }))
}

// ─── Integration tests ────────────────────────────────────────────────────────
