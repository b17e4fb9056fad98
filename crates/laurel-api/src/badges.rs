//! Handler for `GET /badges` — the read-only catalog.

use axum::{Json, extract::State};
use laurel_core::{badge::Badge, store::TaskStore};

use crate::{
  AppState,
  auth::CurrentUser,
  error::{ApiError, store_err},
};

/// `GET /badges`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<Badge>>, ApiError>
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  let catalog = state.store.list_badges().await.map_err(store_err)?;
  Ok(Json(catalog))
}
